//! Application configuration loaded from environment variables.

use std::time::Duration;

use fridge::FridgeConfig;
use fridge::config::{DEFAULT_MAX_SPACE, DEFAULT_MAX_WEIGHT, DEFAULT_REPLY_TIMEOUT};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Console configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `FRIDGE_MAX_WEIGHT` — weight capacity (default: `100`)
/// - `FRIDGE_MAX_SPACE` — item capacity (default: `10`)
/// - `ORDER_REPLY_TIMEOUT_MS` — order aggregator wait, `0` waits forever (default: `5000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `pretty` or `json` (default: `pretty`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_weight: i64,
    pub max_space: i64,
    pub reply_timeout_ms: u64,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; unset or unparsable values fall
    /// back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_weight: lookup("FRIDGE_MAX_WEIGHT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_weight),
            max_space: lookup("FRIDGE_MAX_SPACE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_space),
            reply_timeout_ms: lookup("ORDER_REPLY_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reply_timeout_ms),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }

    /// Order aggregator timeout; `None` when disabled.
    pub fn reply_timeout(&self) -> Option<Duration> {
        (self.reply_timeout_ms > 0).then(|| Duration::from_millis(self.reply_timeout_ms))
    }

    /// Builds the fridge settings, keeping the default initial stock.
    pub fn fridge_config(&self) -> FridgeConfig {
        FridgeConfig::default()
            .with_capacity(self.max_weight, self.max_space)
            .with_reply_timeout(self.reply_timeout())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_weight: DEFAULT_MAX_WEIGHT,
            max_space: DEFAULT_MAX_SPACE,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT.as_millis() as u64,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
