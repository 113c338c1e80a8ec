use crate::error::{EnhanceError, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub path: PathBuf,
    /// Most-recent-N bound; the oldest entry is evicted past this.
    pub limit: usize,
    /// Serialized-size budget triggering the keep-only-latest fallback.
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct UsageConfig {
    pub path: PathBuf,
    pub daily_limit: u32,
    /// Remaining-count at which a warning is logged.
    pub warning_threshold: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub history: HistoryConfig,
    pub usage: UsageConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty());
        let model = env::var("PICSHINE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            env::var("PICSHINE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        GeminiConfig {
            api_key,
            model,
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Credential presence is checked at construction time, not at first
    /// call.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            EnhanceError::ConfigError(
                "GOOGLE_API_KEY is not set; the Gemini client cannot be constructed".into(),
            )
        })
    }

    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key.as_deref().unwrap_or_default()
        )
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            path: PathBuf::from("picshine_history.json"),
            limit: 5,
            max_bytes: 4 * 1024 * 1024,
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let path = env::var("PICSHINE_HISTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.path);
        let limit = env::var("PICSHINE_HISTORY_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.limit);
        let max_bytes = env::var("PICSHINE_HISTORY_MAX_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_bytes);

        HistoryConfig {
            path,
            limit,
            max_bytes,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        UsageConfig {
            path: PathBuf::from("picshine_usage.json"),
            daily_limit: 30,
            warning_threshold: 5,
        }
    }
}

impl UsageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let path = env::var("PICSHINE_USAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.path);
        let daily_limit = env::var("PICSHINE_DAILY_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.daily_limit);
        let warning_threshold = env::var("PICSHINE_WARNING_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.warning_threshold);

        UsageConfig {
            path,
            daily_limit,
            warning_threshold,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_daily_limit(mut self, daily_limit: u32) -> Self {
        self.daily_limit = daily_limit;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: GeminiConfig::default(),
            history: HistoryConfig::default(),
            usage: UsageConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
            history: HistoryConfig::from_env(),
            usage: UsageConfig::from_env(),
        }
    }

    pub fn with_gemini(mut self, gemini: GeminiConfig) -> Self {
        self.gemini = gemini;
        self
    }

    pub fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    pub fn with_usage(mut self, usage: UsageConfig) -> Self {
        self.usage = usage;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_gemini() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.api_key.is_none());
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn builders_chain() {
        let config = GeminiConfig::new()
            .with_api_key("test-key")
            .with_model("gemini-2.0-flash-exp")
            .with_base_url("https://example.com/");
        assert_eq!(config.require_api_key().unwrap(), "test-key");
        assert_eq!(
            config.generate_content_url(),
            "https://example.com/v1beta/models/gemini-2.0-flash-exp:generateContent?key=test-key"
        );
    }

    #[test]
    fn usage_defaults_match_the_app_limits() {
        let usage = UsageConfig::default();
        assert_eq!(usage.daily_limit, 30);
        assert_eq!(usage.warning_threshold, 5);
        assert_eq!(HistoryConfig::default().limit, 5);
    }
}
