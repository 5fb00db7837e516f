//! Rotation engine configuration.
//!
//! Injected at construction; nothing in the engine reads the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::RotationError;
use super::value_objects::ReservedRange;

/// Bounded exponential backoff applied to every outbound call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Upper bound for a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping. Used by tests and dry runs.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            attempt_timeout: Duration::from_secs(10),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Check the policy is usable.
    pub fn validate(&self) -> Result<(), RotationError> {
        if self.max_attempts == 0 {
            return Err(RotationError::InvalidConfig(
                "retry policy needs at least one attempt".to_string(),
            ));
        }
        if self.attempt_timeout.is_zero() {
            return Err(RotationError::InvalidConfig(
                "retry attempt timeout must be positive".to_string(),
            ));
        }
        if self.base_delay > self.max_delay {
            return Err(RotationError::InvalidConfig(format!(
                "retry base delay {:?} exceeds max delay {:?}",
                self.base_delay, self.max_delay
            )));
        }
        Ok(())
    }
}

/// Rotation engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Rule numbers owned by the engine.
    pub reserved_range: ReservedRange,
    /// Backoff for outbound calls.
    pub retry: RetryPolicy,
}

impl RotationConfig {
    /// Create a validated configuration.
    pub fn new(reserved_range: ReservedRange, retry: RetryPolicy) -> Result<Self, RotationError> {
        let config = Self {
            reserved_range,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every part.
    pub fn validate(&self) -> Result<(), RotationError> {
        self.reserved_range.validate()?;
        self.retry.validate()
    }
}
