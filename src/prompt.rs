//! Prompt assembly: a pure mapping from (operation, parameters, normalized
//! image) to the ordered parts sent to the model. Template text is
//! configuration, not contract; template selection and parameter
//! interpolation are the testable part.

use crate::{
    error::{EnhanceError, Result},
    models::{OperationKind, OperationRequest},
    normalize::InlineImage,
};

/// Style used by face-focused enhancement when the caller does not pick one.
/// This is the one sanctioned parameter default; every other required
/// parameter fails fast when absent.
pub const DEFAULT_ENHANCEMENT_STYLE: &str = "natural clarity";

/// Ordered prompt: image first, instruction second. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub image: InlineImage,
    pub instruction: String,
}

const SMART_ENHANCE_TEMPLATE: &str = "Dramatically enhance the provided image. Perform a \
    significant upscaling, aiming for at least a 4x resolution increase, ensuring maximum \
    detail and sharpness. Aggressively reduce noise and artifacts. For human faces, bring out \
    fine details, improve skin texture, and enhance eye clarity for a striking, yet natural \
    result. The output should be a remarkably improved, high-definition version of the \
    original, while respecting its core composition.";

const COLORIZE_TEMPLATE: &str = "Transform the provided image with rich, vivid, and lifelike \
    colors. If it's black and white or grayscale, apply a full, high-fidelity colorization \
    that is both historically accurate (if applicable) and aesthetically stunning. Aim for \
    deep, natural tones and excellent contrast. If already in color, significantly boost its \
    vibrancy, correct any color casts, and enhance overall color harmony for a professional, \
    eye-catching result.";

const REMOVE_SCRATCHES_TEMPLATE: &str = "Analyze the provided image. Identify and carefully \
    remove scratches, creases, small tears, and other minor physical damages. The goal is to \
    restore the image to a cleaner state while preserving original details, textures, and the \
    overall character of the photo. Avoid over-smoothing or creating an artificial look.";

const SHARPEN_TEMPLATE: &str = "Analyze the provided image and apply a sharpening effect to \
    enhance fine details, textures, and edges. The goal is to make the image appear crisper \
    and more defined without introducing excessive noise or artifacts. Focus on improving \
    overall clarity and definition.";

const REMOVE_BACKGROUND_TEMPLATE: &str = "Your task is to precisely remove the background \
    from this image. Identify the primary subject(s) with extreme accuracy. Create a clean, \
    sharp cutout with a fully transparent background. Pay special attention to complex edges \
    like hair, fur, or fine details, ensuring no background remnants are left and the \
    subject's edges are not cropped. The final output must be a high-quality PNG with a \
    perfect alpha channel. Do not add any watermark or alter the subject itself.";

const SUGGEST_IMPROVEMENTS_TEMPLATE: &str = "You are an AI expert in image enhancement. \
    Given the image, suggest a few potential improvements to enhance its visual appeal. \
    Suggest concrete actions like adjusting brightness, contrast, sharpness and color \
    balance. Return the suggestions as a plain list, one suggestion per line.";

fn focus_enhance_face_instruction(style: &str) -> String {
    format!(
        "Identify the primary human face in this image. Apply a '{style}' enhancement \
         specifically to the facial features. Improve skin texture to look smooth yet \
         natural, enhance eye clarity and sparkle, and refine details like lip definition and \
         hair texture around the face. Ensure the enhancements blend seamlessly with the rest \
         of the image and preserve the original character."
    )
}

fn apply_filter_instruction(filter_name: &str) -> String {
    format!(
        "You are an expert AI photo filtering engine. Your single, most important task is to \
         apply a stylistic filter named \"{filter_name}\" to this image while strictly \
         preserving the original subject's identity, pose, and core composition. Interpret \
         the creative style from the filter name, then re-render the image in that style. \
         The output must clearly be the same person and subject: do not alter bone \
         structure, jawline, or unique facial characteristics, and keep the pose and main \
         objects unchanged. Do not add any watermark or text to the image."
    )
}

/// Build the prompt for an operation. Fails only when a required parameter
/// is missing; everything else is deterministic template selection.
pub fn build_prompt(
    kind: OperationKind,
    request: &OperationRequest,
    image: InlineImage,
) -> Result<GenerationPrompt> {
    let instruction = match kind {
        OperationKind::SmartEnhance => SMART_ENHANCE_TEMPLATE.to_string(),
        OperationKind::Colorize => COLORIZE_TEMPLATE.to_string(),
        OperationKind::RemoveScratches => REMOVE_SCRATCHES_TEMPLATE.to_string(),
        OperationKind::Sharpen => SHARPEN_TEMPLATE.to_string(),
        OperationKind::RemoveBackground => REMOVE_BACKGROUND_TEMPLATE.to_string(),
        OperationKind::FocusEnhanceFace => {
            let style = request
                .enhancement_style
                .as_deref()
                .unwrap_or(DEFAULT_ENHANCEMENT_STYLE);
            focus_enhance_face_instruction(style)
        }
        OperationKind::ApplyFilter => {
            let filter_name = request
                .filter_name
                .as_deref()
                .filter(|name| !name.trim().is_empty())
                .ok_or(EnhanceError::MissingParameter {
                    name: "filter_name",
                })?;
            apply_filter_instruction(filter_name)
        }
    };
    Ok(GenerationPrompt { image, instruction })
}

/// Prompt for the text-modality improvement-suggestions call.
pub fn build_suggestions_prompt(image: InlineImage) -> GenerationPrompt {
    GenerationPrompt {
        image,
        instruction: SUGGEST_IMPROVEMENTS_TEMPLATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> InlineImage {
        InlineImage {
            mime_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        }
    }

    fn request() -> OperationRequest {
        OperationRequest::from_data_uri("data:image/png;base64,aGVsbG8=")
    }

    #[test]
    fn prompt_is_deterministic() {
        for kind in OperationKind::ALL {
            let req = request().with_filter("Vintage Film").with_style("soft glow");
            let a = build_prompt(kind, &req, image()).unwrap();
            let b = build_prompt(kind, &req, image()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn each_kind_selects_a_distinct_template() {
        let req = request().with_filter("Vintage Film");
        let mut instructions: Vec<String> = OperationKind::ALL
            .iter()
            .map(|kind| build_prompt(*kind, &req, image()).unwrap().instruction)
            .collect();
        instructions.sort();
        instructions.dedup();
        assert_eq!(instructions.len(), OperationKind::ALL.len());
    }

    #[test]
    fn filter_name_is_interpolated_literally() {
        let req = request().with_filter("Vintage Film");
        let prompt = build_prompt(OperationKind::ApplyFilter, &req, image()).unwrap();
        assert!(prompt.instruction.contains("Vintage Film"));
    }

    #[test]
    fn apply_filter_without_name_fails_fast() {
        let err = build_prompt(OperationKind::ApplyFilter, &request(), image()).unwrap_err();
        assert!(matches!(err, EnhanceError::MissingParameter { name: "filter_name" }));

        let blank = request().with_filter("   ");
        let err = build_prompt(OperationKind::ApplyFilter, &blank, image()).unwrap_err();
        assert!(matches!(err, EnhanceError::MissingParameter { .. }));
    }

    #[test]
    fn face_enhancement_defaults_to_natural_clarity() {
        let prompt = build_prompt(OperationKind::FocusEnhanceFace, &request(), image()).unwrap();
        assert!(prompt.instruction.contains("'natural clarity'"));
    }

    #[test]
    fn face_enhancement_uses_explicit_style() {
        let req = request().with_style("artistic detail");
        let prompt = build_prompt(OperationKind::FocusEnhanceFace, &req, image()).unwrap();
        assert!(prompt.instruction.contains("'artistic detail'"));
        assert!(!prompt.instruction.contains(DEFAULT_ENHANCEMENT_STYLE));
    }

    #[test]
    fn image_rides_along_unchanged() {
        let prompt = build_prompt(OperationKind::Colorize, &request(), image()).unwrap();
        assert_eq!(prompt.image, image());
    }
}
