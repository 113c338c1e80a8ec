use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of image transformations exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SmartEnhance,
    Colorize,
    RemoveScratches,
    FocusEnhanceFace,
    Sharpen,
    RemoveBackground,
    ApplyFilter,
}

impl OperationKind {
    pub const ALL: [OperationKind; 7] = [
        OperationKind::SmartEnhance,
        OperationKind::Colorize,
        OperationKind::RemoveScratches,
        OperationKind::FocusEnhanceFace,
        OperationKind::Sharpen,
        OperationKind::RemoveBackground,
        OperationKind::ApplyFilter,
    ];

    /// Human-readable label interpolated into user-facing error messages,
    /// e.g. "Photo enhancement failed: ...".
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::SmartEnhance => "Photo enhancement",
            OperationKind::Colorize => "Colorization",
            OperationKind::RemoveScratches => "Scratch removal",
            OperationKind::FocusEnhanceFace => "Face-focused enhancement",
            OperationKind::Sharpen => "Image sharpening",
            OperationKind::RemoveBackground => "Background removal",
            OperationKind::ApplyFilter => "Filter application",
        }
    }

    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "smart-enhance" | "enhance" => Some(OperationKind::SmartEnhance),
            "colorize" => Some(OperationKind::Colorize),
            "remove-scratches" => Some(OperationKind::RemoveScratches),
            "focus-enhance-face" | "face" => Some(OperationKind::FocusEnhanceFace),
            "sharpen" => Some(OperationKind::Sharpen),
            "remove-background" => Some(OperationKind::RemoveBackground),
            "apply-filter" | "filter" => Some(OperationKind::ApplyFilter),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One user-initiated enhancement request. Exactly one of `photo_data_uri`
/// and `image_url` must be set; the inline form wins when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationRequest {
    /// Inline image as `data:<mimetype>;base64,<data>`.
    pub photo_data_uri: Option<String>,
    /// Absolute URL of a remote image to fetch and inline.
    pub image_url: Option<String>,
    /// Required for [`OperationKind::ApplyFilter`], e.g. "Vintage Film".
    pub filter_name: Option<String>,
    /// Optional for [`OperationKind::FocusEnhanceFace`]; defaults to
    /// "natural clarity".
    pub enhancement_style: Option<String>,
    /// Original file name, carried through into the history entry.
    pub file_name: Option<String>,
}

impl OperationRequest {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self {
            photo_data_uri: Some(uri.into()),
            ..Default::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter_name: impl Into<String>) -> Self {
        self.filter_name = Some(filter_name.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.enhancement_style = Some(style.into());
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// Successful outcome of an operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResponse {
    /// The transformed image as `data:<mimetype>;base64,<data>`.
    pub photo_data_uri: String,
    pub operation: OperationKind,
    /// Model identifier that produced the image.
    pub model: String,
}

/// Outcome of a text-modality improvement-suggestions call.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
    pub model: String,
}
