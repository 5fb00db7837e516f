//! # Service Layer
//!
//! Orchestrates domain decisions and outbound ports.

pub mod retry;
pub mod rotation_service;

pub use retry::with_retry;
pub use rotation_service::{BlocklistTarget, RotationService};
