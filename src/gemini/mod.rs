pub mod image_client;

use crate::{
    classify::{ErrorClassifier, SubstringClassifier, NO_MEDIA_MESSAGE},
    config::GeminiConfig,
    error::{EnhanceError, Result},
    models::{OperationKind, OperationRequest, OperationResponse, SuggestionsResponse},
    normalize::{normalize, HttpImageFetcher, ImageFetcher},
    prompt::{build_prompt, build_suggestions_prompt},
};
use std::sync::Arc;

pub use image_client::{extract_image, extract_text_lines, GenerationBackend, ImageClient};

const IMAGE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];
const TEXT_MODALITIES: &[&str] = &["TEXT"];

/// Entry point for every operation. Constructed once at startup with a
/// validated credential and passed by reference into call sites; business
/// logic never reads the process environment. Requests are independent, so
/// one client can serve any number of concurrent operations.
#[derive(Clone)]
pub struct GeminiClient {
    model: String,
    fetcher: Arc<dyn ImageFetcher>,
    backend: Arc<dyn GenerationBackend>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl GeminiClient {
    /// Build the real client. Fails immediately when the credential is
    /// absent rather than deferring to the first call.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        config.require_api_key()?;
        let http = reqwest::Client::new();
        let model = config.model.clone();
        Ok(Self {
            model,
            fetcher: Arc::new(HttpImageFetcher::new(http.clone())),
            backend: Arc::new(ImageClient::new(http, config)),
            classifier: Arc::new(SubstringClassifier),
        })
    }

    /// Wire a client from explicit parts. Used by tests and by callers that
    /// need a custom fetcher, backend, or classification table.
    pub fn from_parts(
        model: impl Into<String>,
        fetcher: Arc<dyn ImageFetcher>,
        backend: Arc<dyn GenerationBackend>,
        classifier: Arc<dyn ErrorClassifier>,
    ) -> Self {
        Self {
            model: model.into(),
            fetcher,
            backend,
            classifier,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The one parameterized pipeline behind every operation kind:
    /// normalize, build the prompt, invoke once, extract the image.
    /// Classification runs only on the provider-side failure path;
    /// normalizer failures keep their typed identity.
    pub async fn run(
        &self,
        kind: OperationKind,
        request: &OperationRequest,
    ) -> Result<OperationResponse> {
        let image = normalize(request, self.fetcher.as_ref()).await?;
        let prompt = build_prompt(kind, request, image)?;

        let timer = crate::logger::timer(kind.label());
        let outcome = self.backend.generate(&prompt, IMAGE_MODALITIES).await;
        timer.stop();

        let response = outcome.map_err(|raw| self.provider_error(kind.label(), &raw))?;

        let Some(output) = extract_image(&response) else {
            return Err(self.provider_error(kind.label(), NO_MEDIA_MESSAGE));
        };

        log::info!(
            "{} succeeded ({} base64 chars, {})",
            kind.label(),
            output.data.len(),
            output.mime_type
        );
        Ok(OperationResponse {
            photo_data_uri: output.to_data_uri(),
            operation: kind,
            model: self.model.clone(),
        })
    }

    fn provider_error(&self, label: &str, raw: &str) -> EnhanceError {
        let classified = self.classifier.classify(label, raw);
        log::error!(
            "{label} failed: category={} raw={raw}",
            classified.category.as_str()
        );
        EnhanceError::Provider {
            category: classified.category,
            message: classified.message,
        }
    }

    pub async fn smart_enhance(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.run(OperationKind::SmartEnhance, request).await
    }

    pub async fn colorize(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.run(OperationKind::Colorize, request).await
    }

    pub async fn remove_scratches(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.run(OperationKind::RemoveScratches, request).await
    }

    pub async fn focus_enhance_face(
        &self,
        request: &OperationRequest,
    ) -> Result<OperationResponse> {
        self.run(OperationKind::FocusEnhanceFace, request).await
    }

    pub async fn sharpen(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.run(OperationKind::Sharpen, request).await
    }

    pub async fn remove_background(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.run(OperationKind::RemoveBackground, request).await
    }

    pub async fn apply_filter(&self, request: &OperationRequest) -> Result<OperationResponse> {
        self.run(OperationKind::ApplyFilter, request).await
    }

    /// Text-modality call: ask the model for concrete improvement
    /// suggestions instead of a transformed image.
    pub async fn suggest_improvements(
        &self,
        request: &OperationRequest,
    ) -> Result<SuggestionsResponse> {
        let image = normalize(request, self.fetcher.as_ref()).await?;
        let prompt = build_suggestions_prompt(image);

        let response = self
            .backend
            .generate(&prompt, TEXT_MODALITIES)
            .await
            .map_err(|raw| self.provider_error("Improvement suggestion", &raw))?;

        let suggestions = extract_text_lines(&response);
        if suggestions.is_empty() {
            return Err(EnhanceError::Provider {
                category: crate::error::ErrorCategory::NoMediaReturned,
                message: "AI model did not return any suggestions. Please try again later."
                    .to_string(),
            });
        }
        Ok(SuggestionsResponse {
            suggestions,
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::models::{Candidate, Content, GenerateContentResponse, InlineData, Part};
    use crate::normalize::test_support::MockFetcher;
    use crate::prompt::GenerationPrompt;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum CannedOutcome {
        Image(&'static str),
        Parts(Vec<Part>),
        Failure(String),
    }

    struct MockBackend {
        outcome: CannedOutcome,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<GenerationPrompt>>,
        last_modalities: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn new(outcome: CannedOutcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
                last_modalities: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn seen_prompt(&self) -> GenerationPrompt {
            self.last_prompt.lock().unwrap().clone().expect("no prompt recorded")
        }
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        async fn generate(
            &self,
            prompt: &GenerationPrompt,
            modalities: &[&str],
        ) -> image_client::InvokeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.clone());
            *self.last_modalities.lock().unwrap() =
                modalities.iter().map(|m| m.to_string()).collect();
            match &self.outcome {
                CannedOutcome::Image(data) => Ok(GenerateContentResponse {
                    candidates: vec![Candidate {
                        content: Some(Content {
                            role: Some("model".into()),
                            parts: vec![Part::InlineData {
                                inline_data: InlineData {
                                    mime_type: "image/png".into(),
                                    data: data.to_string(),
                                },
                            }],
                        }),
                        finish_reason: Some("STOP".into()),
                    }],
                }),
                CannedOutcome::Parts(parts) => Ok(GenerateContentResponse {
                    candidates: vec![Candidate {
                        content: Some(Content {
                            role: Some("model".into()),
                            parts: parts.clone(),
                        }),
                        finish_reason: Some("STOP".into()),
                    }],
                }),
                CannedOutcome::Failure(raw) => Err(raw.clone()),
            }
        }
    }

    fn client(fetcher: Arc<MockFetcher>, backend: Arc<MockBackend>) -> GeminiClient {
        GeminiClient::from_parts(
            "gemini-test",
            fetcher,
            backend,
            Arc::new(SubstringClassifier),
        )
    }

    fn deps(outcome: CannedOutcome) -> (Arc<MockFetcher>, Arc<MockBackend>) {
        (
            Arc::new(MockFetcher::new(200, "image/png", b"fetched")),
            Arc::new(MockBackend::new(outcome)),
        )
    }

    const PNG_URI: &str = "data:image/png;base64,aGVsbG8=";

    #[tokio::test]
    async fn missing_input_never_reaches_the_network() {
        for kind in OperationKind::ALL {
            let (fetcher, backend) = deps(CannedOutcome::Image("iVBORw0="));
            let client = client(fetcher.clone(), backend.clone());
            let err = client.run(kind, &OperationRequest::default()).await.unwrap_err();
            assert!(matches!(err, EnhanceError::MissingInput), "kind {kind:?}");
            assert_eq!(fetcher.call_count(), 0);
            assert_eq!(backend.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn failed_fetch_never_reaches_the_invoker() {
        let backend = Arc::new(MockBackend::new(CannedOutcome::Image("iVBORw0=")));
        let fetcher = Arc::new(MockFetcher::new(502, "image/png", b""));
        let client = client(fetcher.clone(), backend.clone());
        let request = OperationRequest::from_url("https://example.com/a.png");
        let err = client.run(OperationKind::Sharpen, &request).await.unwrap_err();
        assert!(matches!(err, EnhanceError::FetchFailed { status: 502 }));
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn text_body_from_fetch_never_reaches_the_invoker() {
        let backend = Arc::new(MockBackend::new(CannedOutcome::Image("iVBORw0=")));
        let fetcher = Arc::new(MockFetcher::new(200, "text/plain", b"hi"));
        let client = client(fetcher, backend.clone());
        let request = OperationRequest::from_url("https://example.com/a.png");
        let err = client.run(OperationKind::Colorize, &request).await.unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidContentType { .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn apply_filter_invokes_once_with_the_filter_name_in_the_prompt() {
        let (fetcher, backend) = deps(CannedOutcome::Image("iVBORw0="));
        let client = client(fetcher, backend.clone());
        let request = OperationRequest::from_data_uri(PNG_URI).with_filter("Vintage Film");

        let response = client.apply_filter(&request).await.unwrap();

        assert_eq!(backend.call_count(), 1);
        assert!(backend.seen_prompt().instruction.contains("Vintage Film"));
        assert_eq!(response.photo_data_uri, "data:image/png;base64,iVBORw0=");
        assert_eq!(response.operation, OperationKind::ApplyFilter);
        let modalities = backend.last_modalities.lock().unwrap().clone();
        assert_eq!(modalities, vec!["TEXT", "IMAGE"]);
    }

    #[tokio::test]
    async fn face_enhancement_defaults_the_style_in_the_outbound_prompt() {
        let (fetcher, backend) = deps(CannedOutcome::Image("iVBORw0="));
        let client = client(fetcher, backend.clone());
        let request = OperationRequest::from_data_uri(PNG_URI);

        client.focus_enhance_face(&request).await.unwrap();

        assert!(backend.seen_prompt().instruction.contains("'natural clarity'"));
    }

    #[tokio::test]
    async fn zero_media_parts_is_no_media_returned_verbatim() {
        let (fetcher, backend) = deps(CannedOutcome::Parts(vec![Part::Text {
            text: "I cannot produce that image.".into(),
        }]));
        let client = client(fetcher, backend);
        let request = OperationRequest::from_data_uri(PNG_URI);

        let err = client.smart_enhance(&request).await.unwrap_err();
        match err {
            EnhanceError::Provider { category, message } => {
                assert_eq!(category, ErrorCategory::NoMediaReturned);
                assert_eq!(message, NO_MEDIA_MESSAGE);
            }
            other => panic!("expected classified provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_failure_goes_through_the_ordered_classifier() {
        let (fetcher, backend) = deps(CannedOutcome::Failure(
            "Quota reached and API key not valid".into(),
        ));
        let client = client(fetcher, backend);
        let request = OperationRequest::from_data_uri(PNG_URI);

        let err = client.remove_background(&request).await.unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::InvalidCredentials));
        let message = err.to_string();
        assert!(message.starts_with("Background removal failed"));
    }

    #[tokio::test]
    async fn missing_filter_name_fails_before_invocation() {
        let (fetcher, backend) = deps(CannedOutcome::Image("iVBORw0="));
        let client = client(fetcher, backend.clone());
        let request = OperationRequest::from_data_uri(PNG_URI);

        let err = client.apply_filter(&request).await.unwrap_err();
        assert!(matches!(err, EnhanceError::MissingParameter { .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn suggestions_use_text_modality_only() {
        let (fetcher, backend) = deps(CannedOutcome::Parts(vec![Part::Text {
            text: "- Increase contrast\n- Crop tighter".into(),
        }]));
        let client = client(fetcher, backend.clone());
        let request = OperationRequest::from_data_uri(PNG_URI);

        let response = client.suggest_improvements(&request).await.unwrap();
        assert_eq!(response.suggestions.len(), 2);
        let modalities = backend.last_modalities.lock().unwrap().clone();
        assert_eq!(modalities, vec!["TEXT"]);
    }
}
