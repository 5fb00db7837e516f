//! # Sentry Configuration
//!
//! Environment-driven settings for one responder deployment.
//!
//! Every variable has a legacy name accepted as a fallback so existing
//! deployments keep working without edits.

use std::env;
use std::time::Duration;
use thiserror::Error;

use ns_01_blocklist_rotation::{ReservedRange, RetryPolicy, RotationConfig, RotationError, RuleNumber};

/// Default region when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("Missing configuration: {key} (or {fallback})")]
    Missing {
        /// Primary variable name
        key: &'static str,
        /// Legacy variable name
        fallback: &'static str,
    },

    /// A variable is set but does not parse.
    #[error("Invalid configuration {key}={value:?}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },

    /// The assembled rotation config was rejected.
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

/// Complete responder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentryConfig {
    /// Name of the durable state table.
    pub state_table: String,
    /// Notification target: an `http(s)://` URL is posted to, anything else
    /// is treated as a topic name and only logged.
    pub notify_topic: String,
    /// Edge (global) IP set id.
    pub edge_ip_set_id: String,
    /// Regional IP set id.
    pub regional_ip_set_id: String,
    /// Region of operation.
    pub region: String,
    /// Rule numbers owned by the responder.
    pub reserved_range: ReservedRange,
    /// Backoff for backend calls.
    pub retry: RetryPolicy,
}

impl SentryConfig {
    /// Load from the process environment.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Fallback | Default |
    /// |----------|----------|---------|
    /// | `NS_STATE_TABLE` | `ACLMETATABLE` | required |
    /// | `NS_NOTIFY_TOPIC` | `SNSTOPIC` | required |
    /// | `NS_EDGE_IP_SET_ID` | `CLOUDFRONT_IP_SET_ID` | required |
    /// | `NS_REGIONAL_IP_SET_ID` | `ALB_IP_SET_ID` | required |
    /// | `NS_REGION` | `AWS_REGION` | `us-east-1` |
    /// | `NS_RULE_RANGE_FIRST` | - | `71` |
    /// | `NS_RULE_RANGE_LAST` | - | `80` |
    /// | `NS_RETRY_ATTEMPTS` | - | `3` |
    /// | `NS_RETRY_BASE_MS` | - | `100` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str, fallback: &'static str| -> Option<String> {
            lookup(key)
                .or_else(|| lookup(fallback))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str, fallback: &'static str| {
            read(key, fallback).ok_or(ConfigError::Missing { key, fallback })
        };

        let first: RuleNumber = parse_or(&lookup, "NS_RULE_RANGE_FIRST", ReservedRange::DEFAULT_FIRST)?;
        let last: RuleNumber = parse_or(&lookup, "NS_RULE_RANGE_LAST", ReservedRange::DEFAULT_LAST)?;

        let defaults = RetryPolicy::default();
        let attempts: u32 = parse_or(&lookup, "NS_RETRY_ATTEMPTS", defaults.max_attempts)?;
        let base_ms: u64 = parse_or(
            &lookup,
            "NS_RETRY_BASE_MS",
            defaults.base_delay.as_millis() as u64,
        )?;
        let base_delay = Duration::from_millis(base_ms);

        let config = Self {
            state_table: require("NS_STATE_TABLE", "ACLMETATABLE")?,
            notify_topic: require("NS_NOTIFY_TOPIC", "SNSTOPIC")?,
            edge_ip_set_id: require("NS_EDGE_IP_SET_ID", "CLOUDFRONT_IP_SET_ID")?,
            regional_ip_set_id: require("NS_REGIONAL_IP_SET_ID", "ALB_IP_SET_ID")?,
            region: read("NS_REGION", "AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            reserved_range: ReservedRange::new(first, last)?,
            retry: RetryPolicy {
                max_attempts: attempts,
                base_delay,
                max_delay: defaults.max_delay.max(base_delay),
                attempt_timeout: defaults.attempt_timeout,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rotation_config()?;
        if self.edge_ip_set_id == self.regional_ip_set_id {
            return Err(ConfigError::Invalid {
                key: "NS_REGIONAL_IP_SET_ID",
                value: self.regional_ip_set_id.clone(),
                reason: "edge and regional IP sets must differ".to_string(),
            });
        }
        Ok(())
    }

    /// Rotation engine settings.
    pub fn rotation_config(&self) -> Result<RotationConfig, ConfigError> {
        Ok(RotationConfig::new(self.reserved_range, self.retry.clone())?)
    }

    /// Whether notifications go to an HTTP endpoint.
    pub fn notify_via_webhook(&self) -> bool {
        self.notify_topic.starts_with("http://") || self.notify_topic.starts_with("https://")
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
