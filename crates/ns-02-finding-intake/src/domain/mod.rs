//! # Domain Layer
//!
//! Event wire shapes, classification and errors.

pub mod errors;
pub mod event;
pub mod finding;

pub use errors::*;
pub use event::*;
pub use finding::*;
