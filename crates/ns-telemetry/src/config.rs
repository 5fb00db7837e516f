//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Filter directive (trace, debug, info, warn, error, or a full EnvFilter)
    pub log_level: String,

    /// Emit JSON lines instead of the human format
    pub json_logs: bool,

    /// Include file and line in log lines
    pub source_locations: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "nacl-sentry".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            source_locations: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NS_SERVICE_NAME`: Service name (default: nacl-sentry)
    /// - `NS_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `NS_JSON_LOGS`: JSON output (default: true inside containers or functions)
    /// - `NS_LOG_SOURCE`: Include file/line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let managed = lookup("KUBERNETES_SERVICE_HOST").is_some()
            || lookup("DOCKER_CONTAINER").is_some()
            || lookup("AWS_LAMBDA_FUNCTION_NAME").is_some();
        let defaults = Self::default();

        Self {
            service_name: lookup("NS_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("NS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("NS_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(managed),
            source_locations: lookup("NS_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.source_locations),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
