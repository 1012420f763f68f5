//! Configuration module for teamwatch
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`TEAMWATCH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use teamwatch::config::TeamwatchConfig;
//!
//! let config = TeamwatchConfig::default();
//! assert_eq!(config.poller.interval_seconds, 15);
//!
//! let toml = r#"
//! [connection]
//! url = "wss://teams.example/ws"
//! "#;
//! let config: TeamwatchConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.connection.url, "wss://teams.example/ws");
//! ```

pub mod connection;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod poller;

pub use connection::ConnectionConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use notifications::NotificationConfig;
pub use poller::PollerConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Unified configuration for the dashboard client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TeamwatchConfig {
    /// Push channel and REST endpoints
    pub connection: ConnectionConfig,
    /// Staleness detection and fallback polling
    pub poller: PollerConfig,
    /// Notification log and deduplication
    pub notifications: NotificationConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl TeamwatchConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports TEAMWATCH_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("TEAMWATCH_URL") {
            self.connection.url = url;
        }
        if let Ok(api_url) = std::env::var("TEAMWATCH_API_URL") {
            self.connection.api_url = api_url;
        }
        if let Ok(token) = std::env::var("TEAMWATCH_TOKEN") {
            if !token.is_empty() {
                self.connection.token = Some(token);
            }
        }

        if let Ok(level) = std::env::var("TEAMWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TEAMWATCH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(poller) = std::env::var("TEAMWATCH_POLLER") {
            self.poller.enabled = poller.to_lowercase() == "true";
        }
        if let Ok(dir) = std::env::var("TEAMWATCH_STORE_DIR") {
            self.notifications.store_dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.connection.url) {
            Ok(u) if matches!(u.scheme(), "ws" | "wss") => {}
            Ok(u) => {
                return Err(ConfigError::invalid(
                    "connection.url",
                    format!("scheme must be ws or wss, got '{}'", u.scheme()),
                ))
            }
            Err(e) => return Err(ConfigError::invalid("connection.url", e.to_string())),
        }

        match url::Url::parse(&self.connection.api_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(ConfigError::invalid(
                    "connection.api_url",
                    format!("scheme must be http or https, got '{}'", u.scheme()),
                ))
            }
            Err(e) => return Err(ConfigError::invalid("connection.api_url", e.to_string())),
        }

        if self.connection.backoff_base_ms == 0 {
            return Err(ConfigError::invalid(
                "connection.backoff_base_ms",
                "must be non-zero",
            ));
        }
        if self.connection.backoff_max_ms < self.connection.backoff_base_ms {
            return Err(ConfigError::invalid(
                "connection.backoff_max_ms",
                "must not be smaller than backoff_base_ms",
            ));
        }

        if self.poller.interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "poller.interval_seconds",
                "must be non-zero",
            ));
        }
        // A quiet channel must get at least one poll before it is judged stale twice.
        if self.poller.stale_threshold_seconds <= self.poller.interval_seconds {
            return Err(ConfigError::invalid(
                "poller.stale_threshold_seconds",
                "must be greater than poller.interval_seconds",
            ));
        }

        if self.notifications.max_entries == 0 {
            return Err(ConfigError::invalid(
                "notifications.max_entries",
                "must be non-zero",
            ));
        }
        if self.notifications.fingerprint_capacity < 2 {
            return Err(ConfigError::invalid(
                "notifications.fingerprint_capacity",
                "must be at least 2",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_defaults() {
        let config = TeamwatchConfig::default();
        assert_eq!(config.connection.url, "ws://localhost:3001/ws");
        assert!(config.poller.enabled);
        assert_eq!(config.notifications.max_entries, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [poller]
        interval_seconds = 5
        "#;

        let config: TeamwatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poller.interval_seconds, 5);
        assert_eq!(config.poller.stale_threshold_seconds, 20); // Default
    }

    #[test]
    fn test_config_parse_example_file() {
        let toml = include_str!("../../teamwatch.example.toml");
        let config: TeamwatchConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[connection]\nbackoff_base_ms = 250").unwrap();

        let config = TeamwatchConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.connection.backoff_base_ms, 250);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = TeamwatchConfig::load(Some(Path::new("/nonexistent/teamwatch.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[connection\nurl=").unwrap();

        let result = TeamwatchConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = TeamwatchConfig::load(None).unwrap();
        assert_eq!(config, TeamwatchConfig::default());
    }

    // Env-var tests each touch a distinct variable so they can run in parallel.

    #[test]
    fn test_config_env_override_token() {
        std::env::set_var("TEAMWATCH_TOKEN", "secret");
        let config = TeamwatchConfig::default().with_env_overrides();
        std::env::remove_var("TEAMWATCH_TOKEN");

        assert_eq!(config.connection.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_config_env_override_log_format() {
        std::env::set_var("TEAMWATCH_LOG_FORMAT", "json");
        let config = TeamwatchConfig::default().with_env_overrides();
        assert_eq!(config.logging.format, LogFormat::Json);

        std::env::set_var("TEAMWATCH_LOG_FORMAT", "xml");
        let config = TeamwatchConfig::default().with_env_overrides();
        std::env::remove_var("TEAMWATCH_LOG_FORMAT");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_env_override_poller() {
        std::env::set_var("TEAMWATCH_POLLER", "false");
        let config = TeamwatchConfig::default().with_env_overrides();
        std::env::remove_var("TEAMWATCH_POLLER");

        assert!(!config.poller.enabled);
    }

    #[test]
    fn test_config_validation_rejects_http_push_url() {
        let mut config = TeamwatchConfig::default();
        config.connection.url = "http://localhost:3001/ws".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "connection.url"
        ));
    }

    #[test]
    fn test_config_validation_rejects_bad_api_url() {
        let mut config = TeamwatchConfig::default();
        config.connection.api_url = "not a url".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "connection.api_url"
        ));
    }

    #[test]
    fn test_config_validation_threshold_must_exceed_interval() {
        let mut config = TeamwatchConfig::default();
        config.poller.stale_threshold_seconds = config.poller.interval_seconds;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. })
                if field == "poller.stale_threshold_seconds"
        ));
    }

    #[test]
    fn test_config_validation_backoff_bounds() {
        let mut config = TeamwatchConfig::default();
        config.connection.backoff_max_ms = 10;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "connection.backoff_max_ms"
        ));
    }

    #[test]
    fn test_config_validation_fingerprint_capacity() {
        let mut config = TeamwatchConfig::default();
        config.notifications.fingerprint_capacity = 1;

        assert!(config.validate().is_err());
    }
}
