//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable carrying the environment tag stamped on access logs.
pub const ENV_APP_ENV: &str = "APP_ENV";

/// Environment variable carrying the log verbosity.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Logging settings and the environment tag.
    pub observability: ObservabilityConfig,

    /// Metrics collector options.
    pub metrics: MetricsConfig,

    /// Request limits.
    pub limits: LimitsConfig,
}

impl ServiceConfig {
    /// Apply `APP_ENV` and `LOG_LEVEL` overrides.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup(ENV_APP_ENV).filter(|v| !v.trim().is_empty()) {
            self.observability.environment = env;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.observability.log_level = level.to_uppercase();
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact single-line text; record payloads are already JSON.
    #[default]
    Text,
    /// Every event rendered as a JSON object by the subscriber.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Environment tag included in every access-log record.
    pub environment: String,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            log_level: "INFO".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Metrics collector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Scrape endpoint path.
    pub endpoint: String,

    /// Collapse status codes to `2xx`/`3xx`/`4xx`/`5xx`.
    pub group_status_codes: bool,

    /// Skip requests that did not match a registered route template.
    pub ignore_untemplated: bool,

    /// Paths never observed (matched against template and raw path).
    pub excluded_paths: Vec<String>,

    /// Bucket bounds (seconds) for `http_request_duration_seconds`.
    pub duration_buckets: Vec<f64>,

    /// Interval between recorder upkeep passes, in seconds.
    pub upkeep_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            endpoint: "/metrics".to_string(),
            group_status_codes: true,
            ignore_untemplated: true,
            excluded_paths: vec!["/metrics".to_string()],
            duration_buckets: vec![0.1, 0.5, 1.0],
            upkeep_interval_secs: 5,
        }
    }
}

/// Limits applied to every request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Maximum body size for webhook deliveries. A rejected delivery is
    /// retried by the sender, so this is set well above `max_body_size`.
    pub webhook_max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_body_size: 2 * 1024 * 1024, // 2MB
            webhook_max_body_size: 32 * 1024 * 1024, // 32MB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_service_conventions() {
        let config = ServiceConfig::default();
        assert_eq!(config.observability.environment, "dev");
        assert_eq!(config.observability.log_level, "INFO");
        assert!(config.metrics.group_status_codes);
        assert!(config.metrics.ignore_untemplated);
        assert_eq!(config.metrics.excluded_paths, vec!["/metrics".to_string()]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [metrics]
            group_status_codes = false

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert!(!config.metrics.group_status_codes);
        assert_eq!(config.metrics.endpoint, "/metrics");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [("APP_ENV", "prod"), ("LOG_LEVEL", "debug")].into();
        let mut config = ServiceConfig::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.observability.environment, "prod");
        assert_eq!(config.observability.log_level, "DEBUG");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = ServiceConfig::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config.observability.environment, "dev");
        assert_eq!(config.observability.log_level, "INFO");
    }
}
