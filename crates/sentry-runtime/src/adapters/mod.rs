//! # Runtime Adapters
//!
//! Notification sinks and the local sandbox that backs the rotation ports.

pub mod notify;
pub mod sandbox;

pub use notify::{BlockNotice, LogNotifier, Notifier, NotifyError, WebhookNotifier, NOTICE_SUBJECT};
pub use sandbox::{Sandbox, SandboxError, SandboxState};
