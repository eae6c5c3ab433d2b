//! Monitor configuration management.
//!
//! Loads the monitor configuration from a TOML file with environment variable
//! override support, and derives the pull and push endpoint URLs from the
//! configured backend base URL.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file location, relative to the workspace root
pub const DEFAULT_CONFIG_PATH: &str = "demo/data/config/monitor.toml";

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Dashboard backend base URL (scheme decides ws vs wss)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Portfolio/risk poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before reconnecting the push channel, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Treat a transport error as a close and reconnect
    #[serde(default = "default_reconnect_on_error")]
    pub reconnect_on_error: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    30_000
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_reconnect_on_error() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reconnect_on_error: default_reconnect_on_error(),
            log_level: default_log_level(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from the given path, falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::info!(path = %path.display(), error = %e, "Using default monitor config");
                Self::default()
            }
        }
    }

    /// Apply environment variable overrides
    pub fn with_env_override(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `MONITOR_*` overrides resolved through `lookup`; unparsable values are ignored
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup("MONITOR_BASE_URL") {
            self.base_url = base_url;
        }

        if let Some(ms) = lookup("MONITOR_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.poll_interval_ms = ms;
        }

        if let Some(ms) = lookup("MONITOR_RECONNECT_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.reconnect_delay_ms = ms;
        }

        if let Some(flag) = lookup("MONITOR_RECONNECT_ON_ERROR") {
            self.reconnect_on_error = match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => self.reconnect_on_error,
            };
        }

        if let Some(log_level) = lookup("MONITOR_LOG_LEVEL") {
            self.log_level = log_level;
        }

        self
    }

    /// Validate the configuration, collecting every problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, valid_log_levels
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(format!(
                "Invalid base_url '{}'. Must start with http:// or https://",
                self.base_url
            ));
        }

        if self.poll_interval_ms == 0 {
            errors.push("poll_interval_ms must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Base URL of the pull endpoints, e.g. `http://host:3000/api`
    pub fn api_base(&self) -> String {
        format!("{}/api", self.base_url.trim_end_matches('/'))
    }

    /// Push channel URL; `https` maps to `wss`, anything else to `ws`
    pub fn push_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let (scheme, rest) = match base.split_once("://") {
            Some(("https", rest)) => ("wss", rest),
            Some((_, rest)) => ("ws", rest),
            None => ("ws", base),
        };
        format!("{}://{}/api/ws", scheme, rest)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Configuration error type
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(String),
    /// Parse error in config file
    #[error("Parse error: {0}")]
    Parse(String),
    /// Validation error
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(30_000));
        assert_eq!(config.reconnect_delay(), Duration::from_millis(3_000));
        assert!(config.reconnect_on_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MONITOR_RECONNECT_DELAY_MS", "250"),
            ("MONITOR_RECONNECT_ON_ERROR", "no"),
            ("MONITOR_POLL_INTERVAL_MS", "soon"),
        ]
        .into_iter()
        .collect();
        let config = MonitorConfig::default().with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.reconnect_delay_ms, 250);
        assert!(!config.reconnect_on_error);
        assert_eq!(config.poll_interval_ms, 30_000);
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_push_url_follows_transport_security() {
        let mut config = MonitorConfig::default();
        config.base_url = "http://localhost:3000/".to_string();
        assert_eq!(config.push_url(), "ws://localhost:3000/api/ws");
        assert_eq!(config.api_base(), "http://localhost:3000/api");

        config.base_url = "https://risk.example.com".to_string();
        assert_eq!(config.push_url(), "wss://risk.example.com/api/ws");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = MonitorConfig {
            base_url: "localhost:3000".to_string(),
            poll_interval_ms: 0,
            log_level: "loud".to_string(),
            ..MonitorConfig::default()
        };

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.contains("base_url")));
                assert!(errors.iter().any(|e| e.contains("poll_interval_ms")));
                assert!(errors.iter().any(|e| e.contains("log_level")));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_log_levels() {
        for level in &["trace", "debug", "info", "warn", "error", "INFO"] {
            let mut config = MonitorConfig::default();
            config.log_level = level.to_string();
            assert!(config.validate().is_ok(), "Log level '{}' should be valid", level);
        }
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = \"https://xva.internal:8443\"").unwrap();
        writeln!(file, "reconnect_on_error = false").unwrap();

        let config = MonitorConfig::load(file.path()).unwrap();
        assert_eq!(config.base_url, "https://xva.internal:8443");
        assert!(!config.reconnect_on_error);
        assert_eq!(config.poll_interval_ms, 30_000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = MonitorConfig::load(Path::new("/nonexistent/monitor.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = \"soon\"").unwrap();
        let result = MonitorConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_sample_config_parses() {
        let config: MonitorConfig =
            toml::from_str(include_str!("../../data/config/monitor.toml")).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.poll_interval_ms, 30_000);
        assert!(config.validate().is_ok());
    }
}
