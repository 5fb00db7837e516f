//! # Algorithms Module
//!
//! Event parsing and extraction.

pub mod extract;

pub use extract::{extract, parse_event};
