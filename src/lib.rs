//! PicShine: a client library for Gemini-backed photo enhancement.
//!
//! Every operation (smart enhance, colorize, scratch removal, face-focused
//! enhancement, sharpening, background removal, stylistic filters) runs the
//! same pipeline: normalize the input image into an inline data URI, build
//! the operation's fixed prompt, make one `generateContent` call, and
//! extract the returned image. Failures are classified into stable
//! categories with user-safe messages; raw provider payloads never reach
//! the caller.
//!
//! ```no_run
//! use picshine::{GeminiClient, GeminiConfig, OperationRequest};
//!
//! # async fn demo() -> picshine::Result<()> {
//! let client = GeminiClient::new(GeminiConfig::from_env())?;
//! let request = OperationRequest::from_data_uri("data:image/png;base64,...")
//!     .with_filter("Vintage Film");
//! let result = client.apply_filter(&request).await?;
//! println!("{}", result.photo_data_uri);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod gemini;
pub mod history;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod prompt;

pub use classify::{ClassifiedError, ErrorClassifier, SubstringClassifier};
pub use config::{Config, GeminiConfig, HistoryConfig, UsageConfig};
pub use error::{EnhanceError, ErrorCategory, Result};
pub use gemini::{GeminiClient, GenerationBackend, ImageClient};
pub use history::{HistoryItem, HistoryStore, UsageTracker, UsageVerdict};
pub use models::{OperationKind, OperationRequest, OperationResponse, SuggestionsResponse};
pub use normalize::{HttpImageFetcher, ImageFetcher, InlineImage};
pub use prompt::{GenerationPrompt, DEFAULT_ENHANCEMENT_STYLE};
