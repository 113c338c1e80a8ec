//! Console logging backend for the `log` facade: colored, timestamped
//! output with development/production presets and a timer for measuring the
//! generation round-trip.

use chrono::Utc;
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Instant;

static CONSOLE_LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let min_level = config.min_level;
    CONSOLE_LOGGER.update_config(config);
    log::set_logger(&*CONSOLE_LOGGER).map_err(|e| format!("Failed to set logger: {e:?}"))?;
    log::set_max_level(min_level);
    Ok(())
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LevelFilter,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub include_timestamp: bool,
    pub show_module: bool,
    pub timestamp_format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: true,
            show_emojis: true,
            include_timestamp: true,
            show_module: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn development() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        Self {
            min_level: LevelFilter::Info,
            show_colors: false,
            show_emojis: false,
            ..Default::default()
        }
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::Trace => "🔍",
        Level::Debug => "🐛",
        Level::Info => "💡",
        Level::Warn => "⚠️",
        Level::Error => "❌",
    }
}

struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) {
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
    }

    fn format_line(&self, record: &Record, config: &LoggerConfig) -> String {
        let mut line = String::new();

        if config.include_timestamp {
            let timestamp = Utc::now().format(&config.timestamp_format).to_string();
            if config.show_colors {
                line.push_str(&format!("{} ", timestamp.bright_black()));
            } else {
                line.push_str(&format!("{timestamp} "));
            }
        }

        let level_str = if config.show_emojis {
            format!("{} {}", level_emoji(record.level()), record.level())
        } else {
            record.level().to_string()
        };
        if config.show_colors {
            line.push_str(&format!(
                "[{}] ",
                level_str.color(level_color(record.level())).bold()
            ));
        } else {
            line.push_str(&format!("[{level_str}] "));
        }

        if config.show_module {
            let module = record.module_path().unwrap_or("unknown");
            if config.show_colors {
                line.push_str(&format!("{}::", module.bright_blue()));
            } else {
                line.push_str(&format!("{module}::"));
            }
        }

        line.push_str(&record.args().to_string());
        line
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level,
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(config) = self.config.lock() {
            println!("{}", self.format_line(record, &config));
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Measures one operation's wall time and logs it once, on `stop` or drop.
pub struct Timer {
    start: Instant,
    name: String,
    done: bool,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        Self {
            start: Instant::now(),
            name: name.to_string(),
            done: false,
        }
    }

    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            log::info!(
                "⏱️  {} took {:.2}s",
                self.name,
                self.start.elapsed().as_secs_f64()
            );
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.finish();
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {app_name} v{version}");
    log::info!("📝 Logger initialized successfully");
}

/// Logs the loaded configuration, including whether the Gemini credential is
/// present. Run once at process start so a missing key surfaces immediately
/// instead of on the first call.
pub fn log_config_info(config: &crate::config::Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Model: {}", config.gemini.model);
    log::info!("   Base URL: {}", config.gemini.base_url);
    match &config.gemini.api_key {
        Some(key) => log::info!(
            "   GOOGLE_API_KEY: ✅ (starts with {}...)",
            &key[..4.min(key.len())]
        ),
        None => log::error!("   GOOGLE_API_KEY: ❌ not set — generation calls will be refused"),
    }
    log::info!(
        "   History: {} items max at {}",
        config.history.limit,
        config.history.path.display()
    );
    log::info!(
        "   Daily limit: {} (warn at {} remaining)",
        config.usage.daily_limit,
        config.usage.warning_threshold
    );
}
