//! # Algorithms Module
//!
//! Pure rotation decisions, free of I/O.

pub mod release;
pub mod slot_planner;

pub use release::is_still_active;
pub use slot_planner::{check_consistency, next_inserted_at, plan_slot, SlotPlan};
