//! Maps raw provider failure text to an [`ErrorCategory`] and a user-safe
//! message.
//!
//! The provider reports failures as free-form text, so classification is an
//! ordered table of substring predicates evaluated top to bottom; the first
//! match wins. Precedence is load-bearing: specific patterns (e.g. the
//! no-media diagnostic) sit above generic ones, and the credential check
//! sits above the quota check so a message mentioning both is reported as a
//! credential problem. The table is deliberately explicit rather than
//! clever, since provider wording drifts and each row needs to be testable
//! on its own.

use crate::error::ErrorCategory;

/// A classified provider failure: one category plus a display message that
/// names the failed operation and, where possible, a remediation hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
}

/// Classification seam. The default implementation matches substrings; call
/// sites only depend on this trait so the predicate table can evolve
/// independently.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, operation: &str, raw: &str) -> ClassifiedError;
}

/// Diagnostic raised by the result extractor when a response carries no
/// image part. The classifier passes this text through to the user
/// unchanged, so it must stay in sync with [`NO_MEDIA_TRIGGER`].
pub const NO_MEDIA_MESSAGE: &str = "AI model did not return an image. This could be due to \
    content safety filters blocking the request, an issue with the input image, or a temporary \
    model problem. Please try a different image or try again later.";

const NO_MEDIA_TRIGGER: &str = "ai model did not return an image";

/// Known noindex boilerplate some hosting layers emit; a fragment of it is
/// not evidence of a truncated upstream error page.
const ROBOTS_NOINDEX_BOILERPLATE: &str =
    "<html><head><meta name=\"robots\" content=\"noindex\"/></head><body>";

enum Trigger {
    /// Any of these lower-cased substrings.
    AnyOf(&'static [&'static str]),
    /// Fixed no-media diagnostic; message is passed through verbatim.
    NoMedia,
    /// Server-side fault heuristics, including the truncated-HTML check.
    UpstreamFault,
}

impl Trigger {
    fn matches(&self, raw: &str, lower: &str) -> bool {
        match self {
            Trigger::AnyOf(needles) => needles.iter().any(|n| lower.contains(n)),
            Trigger::NoMedia => lower.contains(NO_MEDIA_TRIGGER),
            Trigger::UpstreamFault => {
                raw.starts_with("CRITICAL:")
                    || lower.contains("an error occurred in the server components render")
                    || (lower.contains("google ai") && lower.contains("failed"))
                    || lower.contains("internal server error")
                    || lower.contains("failed to fetch")
                    || is_truncated_html_fragment(raw, lower)
            }
        }
    }
}

/// A short response containing an opening `<html` with no closing tag is a
/// truncated upstream error page, not a provider message.
fn is_truncated_html_fragment(raw: &str, lower: &str) -> bool {
    lower.contains("<html")
        && !lower.contains("</html>")
        && raw.len() < 300
        && !lower.contains(ROBOTS_NOINDEX_BOILERPLATE)
}

/// Ordered classification table; first match wins.
const RULES: &[(Trigger, ErrorCategory)] = &[
    (
        Trigger::AnyOf(&[
            "not available in your country",
            "image generation is not available in your country",
        ]),
        ErrorCategory::RegionUnavailable,
    ),
    (Trigger::UpstreamFault, ErrorCategory::UpstreamServerFault),
    (
        Trigger::AnyOf(&[
            "api key not valid",
            "permission denied",
            "authentication failed",
            "api_key_not_valid",
        ]),
        ErrorCategory::InvalidCredentials,
    ),
    (
        Trigger::AnyOf(&["quota", "limit"]),
        ErrorCategory::QuotaExceeded,
    ),
    (
        Trigger::AnyOf(&[
            "billing account not found",
            "billing",
            "project_not_linked_to_billing_account",
        ]),
        ErrorCategory::BillingIssue,
    ),
    (
        Trigger::AnyOf(&["blocked by safety setting", "safety policy violation"]),
        ErrorCategory::SafetyBlocked,
    ),
    (Trigger::NoMedia, ErrorCategory::NoMediaReturned),
    (
        Trigger::AnyOf(&[
            "generative language api has not been used",
            "api is not enabled",
        ]),
        ErrorCategory::ApiNotEnabled,
    ),
];

fn message_for(category: ErrorCategory, operation: &str, raw: &str) -> String {
    match category {
        ErrorCategory::RegionUnavailable => format!(
            "{operation} failed: this AI feature is not available in your current region or \
             country. Check Google Cloud service availability."
        ),
        ErrorCategory::UpstreamServerFault => format!(
            "CRITICAL: {operation} failed due to a server-side configuration issue. Check the \
             server logs for the detailed error; this is often related to the Google AI API \
             key, billing, or permissions."
        ),
        ErrorCategory::InvalidCredentials => format!(
            "{operation} failed: server configuration error (API key or permissions). Ensure \
             GOOGLE_API_KEY is set to a valid credential and check the server logs."
        ),
        ErrorCategory::QuotaExceeded => format!(
            "{operation} failed: service demand or quota limit reached. Please try again later."
        ),
        ErrorCategory::BillingIssue => format!(
            "{operation} failed: billing account issue. Ensure the Google Cloud project has an \
             active billing account and check the server logs."
        ),
        ErrorCategory::SafetyBlocked => format!(
            "{operation} failed: the image was blocked by the content safety policy. Try a \
             different image."
        ),
        ErrorCategory::NoMediaReturned => raw.to_string(),
        ErrorCategory::ApiNotEnabled => format!(
            "{operation} failed: the Google Generative Language API is not enabled for this \
             project or has not been used before. Enable it in the Google Cloud Console and \
             try again."
        ),
        ErrorCategory::Unclassified | ErrorCategory::NetworkFetchFailure => {
            let display = if raw.len() < 200 {
                raw
            } else {
                "See server logs for full details."
            };
            format!("{operation} error: {display}")
        }
    }
}

/// Default ordered-substring classifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringClassifier;

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, operation: &str, raw: &str) -> ClassifiedError {
        let lower = raw.to_lowercase();
        for (trigger, category) in RULES {
            if trigger.matches(raw, &lower) {
                return ClassifiedError {
                    category: *category,
                    message: message_for(*category, operation, raw),
                };
            }
        }
        ClassifiedError {
            category: ErrorCategory::Unclassified,
            message: message_for(ErrorCategory::Unclassified, operation, raw),
        }
    }
}
