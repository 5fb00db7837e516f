//! End-to-end scenarios.

pub mod rotation;
