//! # NACL-Sentry Runtime
//!
//! Wires finding intake, blocklist rotation and notification into one
//! invocation.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and dependency wiring
//! - `adapters/` - Notifiers and the local sandbox backends
//! - `handlers/` - Finding handler
//!
//! ## Flow
//!
//! ```text
//! Finding event ──→ Intake(02) ──→ resolve subnet ──→ Rotation(01) ──→ Notifier
//!                                       │                  │
//!                                       ↓                  ↓
//!                                    Skipped      rule list, state table,
//!                                                 edge + regional IP sets
//! ```

pub mod adapters;
pub mod container;
pub mod handlers;

pub use adapters::{BlockNotice, LogNotifier, Notifier, NotifyError, Sandbox, SandboxState, WebhookNotifier};
pub use container::{ConfigError, ContainerError, SentryConfig, SentryContainer};
pub use handlers::{FindingHandler, HandlerError, HandlerOutcome};
