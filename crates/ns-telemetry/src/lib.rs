//! # NS Telemetry
//!
//! Logging and metrics shared by the responder crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ns_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ns_telemetry::SYNC_FAULTS.inc();
//! println!("{}", ns_telemetry::gather_metrics()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `NS_SERVICE_NAME` | `nacl-sentry` | Service name in log lines |
//! | `NS_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `NS_JSON_LOGS` | `false` (`true` when managed) | JSON output |
//! | `NS_LOG_SOURCE` | `false` | File and line in log lines |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, register_metrics, BLOCKLIST_FAILURES, EVICTIONS, FINDINGS_SKIPPED,
    NOTIFY_FAILURES, RECONCILIATIONS, REGISTRY, SYNC_FAULTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Registry or encoder failure.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Unusable configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Increment a counter, optionally labelled.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
