use serde::{Deserialize, Serialize};

use crate::core::{DeferredId, Value};

/// A rejected Deferred nobody registered a reaction on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnobservedRejection {
    pub deferred: DeferredId,
    pub reason: Value,
}

impl std::fmt::Display for UnobservedRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Uncaught (in promise) {}", self.reason)
    }
}

/// Summary of one call to [`crate::runtime::Runtime::run`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub microtasks_run: usize,
    pub macrotasks_run: usize,
    /// Virtual clock when the loop drained.
    pub clock: u64,
    pub unobserved: Vec<UnobservedRejection>,
}

impl RunReport {
    pub fn ticks(&self) -> usize {
        self.microtasks_run + self.macrotasks_run
    }

    /// True when the run executed nothing and reported nothing.
    pub fn is_quiet(&self) -> bool {
        self.ticks() == 0 && self.unobserved.is_empty()
    }
}
