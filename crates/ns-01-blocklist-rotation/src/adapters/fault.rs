//! Fault injection shared by the in-memory adapters.
//!
//! Lets tests make a specific operation fail a number of times (or forever)
//! and count how often each operation was attempted.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::domain::{BackendError, Operation};

#[derive(Debug, Clone)]
struct Fault {
    error: BackendError,
    /// `None` = fail until cleared.
    remaining: Option<u32>,
}

/// Per-operation failure plan and attempt counters.
#[derive(Debug, Default)]
pub struct FaultInjector {
    faults: Mutex<HashMap<Operation, Fault>>,
    attempts: Mutex<HashMap<Operation, usize>>,
}

impl FaultInjector {
    /// Empty plan: every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `operation` with `error` until `clear` is called.
    pub fn fail_always(&self, operation: Operation, error: BackendError) {
        self.faults.lock().insert(
            operation,
            Fault {
                error,
                remaining: None,
            },
        );
    }

    /// Fail the next `times` calls of `operation`.
    pub fn fail_times(&self, operation: Operation, times: u32, error: BackendError) {
        self.faults.lock().insert(
            operation,
            Fault {
                error,
                remaining: Some(times),
            },
        );
    }

    /// Remove every planned failure; counters are kept.
    pub fn clear(&self) {
        self.faults.lock().clear();
    }

    /// Attempts recorded for `operation`.
    pub fn attempts(&self, operation: Operation) -> usize {
        self.attempts.lock().get(&operation).copied().unwrap_or(0)
    }

    /// Register an attempt and return the planned failure, if any.
    pub fn check(&self, operation: Operation) -> Result<(), BackendError> {
        *self.attempts.lock().entry(operation).or_insert(0) += 1;

        let mut faults = self.faults.lock();
        let Some(fault) = faults.get_mut(&operation) else {
            return Ok(());
        };
        let remaining = fault.remaining;
        let error = fault.error.clone();
        match remaining {
            None => Err(error),
            Some(n) if n > 1 => {
                fault.remaining = Some(n - 1);
                Err(error)
            }
            Some(n) => {
                faults.remove(&operation);
                if n == 0 {
                    Ok(())
                } else {
                    Err(error)
                }
            }
        }
    }
}
