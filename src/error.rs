use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category assigned to a failed operation. Provider-side failures are
/// classified from raw error text (see [`crate::classify`]); the remaining
/// variants are produced directly by the pipeline stage that detected them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    InvalidCredentials,
    BillingIssue,
    ApiNotEnabled,
    RegionUnavailable,
    QuotaExceeded,
    SafetyBlocked,
    NoMediaReturned,
    UpstreamServerFault,
    NetworkFetchFailure,
    Unclassified,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidCredentials => "invalid_credentials",
            ErrorCategory::BillingIssue => "billing_issue",
            ErrorCategory::ApiNotEnabled => "api_not_enabled",
            ErrorCategory::RegionUnavailable => "region_unavailable",
            ErrorCategory::QuotaExceeded => "quota_exceeded",
            ErrorCategory::SafetyBlocked => "safety_blocked",
            ErrorCategory::NoMediaReturned => "no_media_returned",
            ErrorCategory::UpstreamServerFault => "upstream_server_fault",
            ErrorCategory::NetworkFetchFailure => "network_fetch_failure",
            ErrorCategory::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Neither an inline data URI nor an image URL was supplied.
    #[error("No input image provided: supply either a photo data URI or an image URL.")]
    MissingInput,

    /// The remote image fetch returned a non-2xx status.
    #[error("Fetching the remote image failed with HTTP status {status}.")]
    FetchFailed { status: u16 },

    /// The remote image fetch returned a body that is not an image.
    #[error("The remote URL did not return an image (content-type was \"{got}\").")]
    InvalidContentType { got: String },

    /// The inline payload was not a well-formed, non-empty image data URI.
    #[error("Invalid image data URI: {0}")]
    InvalidDataUri(String),

    /// An operation-specific required parameter was absent.
    #[error("Missing required parameter \"{name}\" for this operation.")]
    MissingParameter { name: &'static str },

    /// A provider-side failure that went through the error classifier.
    #[error("{message}")]
    Provider {
        category: ErrorCategory,
        message: String,
    },

    #[error("History storage error: {0}")]
    StorageError(String),
}

impl EnhanceError {
    /// Category for the failure, for callers that bucket errors rather than
    /// display them. Normalizer failures keep their own identity and never
    /// go through the substring classifier.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            EnhanceError::FetchFailed { .. } => Some(ErrorCategory::NetworkFetchFailure),
            EnhanceError::Provider { category, .. } => Some(*category),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
