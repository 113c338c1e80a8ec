//! The generation invoker: one `generateContent` call per operation, no
//! retries, no streaming, no timeout. Provider and transport failures leave
//! this layer as raw text; classification happens at the pipeline boundary.

use crate::{
    config::GeminiConfig,
    models::{
        default_safety_settings, Content, GenerateContentRequest, GenerateContentResponse,
        GenerationConfig, InlineData, Part,
    },
    normalize::InlineImage,
    prompt::GenerationPrompt,
};
use async_trait::async_trait;

/// Raw outcome of an invocation; the error side is unclassified provider
/// text.
pub type InvokeResult = std::result::Result<GenerateContentResponse, String>;

/// Seam over the external model call so tests can fake responses and assert
/// call counts.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &GenerationPrompt, modalities: &[&str]) -> InvokeResult;
}

/// HTTP backend for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct ImageClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl ImageClient {
    pub fn new(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    fn build_request(prompt: &GenerationPrompt, modalities: &[&str]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: prompt.image.mime_type.clone(),
                            data: prompt.image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: prompt.instruction.clone(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: modalities.iter().map(|m| m.to_string()).collect(),
            },
            safety_settings: default_safety_settings(),
        }
    }
}

#[async_trait]
impl GenerationBackend for ImageClient {
    async fn generate(&self, prompt: &GenerationPrompt, modalities: &[&str]) -> InvokeResult {
        let url = self.config.generate_content_url();
        let payload = Self::build_request(prompt, modalities);

        log::info!("Invoking model: {}", self.config.model);
        log::debug!(
            "Generation request: {} byte image ({}), {} char instruction",
            prompt.image.data.len(),
            prompt.image.mime_type,
            prompt.instruction.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;

        if !status.is_success() {
            log::error!("Gemini API returned {status}: {}", truncate(&body, 500));
            // Surface the provider's own message when the envelope parses;
            // the raw body otherwise.
            let message = serde_json::from_str::<crate::models::ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(message);
        }

        serde_json::from_str(&body).map_err(|e| format!("Unparseable model response: {e}"))
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pull the generated image out of a response. Absence of an image part is
/// a distinct failure mode handled by the caller.
pub fn extract_image(response: &GenerateContentResponse) -> Option<InlineImage> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .into_iter()
        .flat_map(|content| content.parts.iter())
        .find_map(|part| match part {
            Part::InlineData { inline_data } if inline_data.mime_type.starts_with("image/") => {
                Some(InlineImage {
                    mime_type: inline_data.mime_type.clone(),
                    data: inline_data.data.clone(),
                })
            }
            _ => None,
        })
}

/// Pull the text parts out of a response, one suggestion per non-empty
/// line.
pub fn extract_text_lines(response: &GenerateContentResponse) -> Vec<String> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .into_iter()
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .flat_map(str::lines)
        .map(|line| line.trim().trim_start_matches(['-', '*', ' ']).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
