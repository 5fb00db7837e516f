//! # Event Handlers
//!
//! Entry point for inbound findings.

pub mod finding;

pub use finding::{FindingHandler, HandlerError, HandlerOutcome};
