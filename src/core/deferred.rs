//! Deferred (Promise analogue) data model.
//!
//! A Deferred is a single-assignment container: it starts pending and
//! transitions exactly once into fulfilled or rejected. Waiters registered
//! while pending are handed back on settlement so the caller can schedule
//! one notification per waiter; waiters registered after settlement get the
//! settlement back immediately instead of being stored.

use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a Deferred within a single runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeferredId(pub(crate) usize);

impl DeferredId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for DeferredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Terminal outcome of a Deferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum Settlement {
    Fulfilled(Value),
    Rejected(Value),
}

impl Settlement {
    pub fn value(&self) -> &Value {
        match self {
            Settlement::Fulfilled(v) | Settlement::Rejected(v) => v,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }
}

impl From<Result<Value, Value>> for Settlement {
    fn from(completion: Result<Value, Value>) -> Self {
        match completion {
            Ok(value) => Settlement::Fulfilled(value),
            Err(reason) => Settlement::Rejected(reason),
        }
    }
}

/// Observable state of a Deferred.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum DeferredState {
    #[default]
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

impl DeferredState {
    pub fn is_pending(&self) -> bool {
        matches!(self, DeferredState::Pending)
    }

    pub fn settlement(&self) -> Option<Settlement> {
        match self {
            DeferredState::Pending => None,
            DeferredState::Fulfilled(v) => Some(Settlement::Fulfilled(v.clone())),
            DeferredState::Rejected(v) => Some(Settlement::Rejected(v.clone())),
        }
    }
}

impl From<Settlement> for DeferredState {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Settlement::Fulfilled(v) => DeferredState::Fulfilled(v),
            Settlement::Rejected(v) => DeferredState::Rejected(v),
        }
    }
}

/// Renders the way the Node console prints a promise.
impl fmt::Display for DeferredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredState::Pending => write!(f, "Promise {{ <pending> }}"),
            DeferredState::Fulfilled(v) => write!(f, "Promise {{ {} }}", v.inspect()),
            DeferredState::Rejected(v) => write!(f, "Promise {{ <rejected>: {} }}", v.inspect()),
        }
    }
}

/// A Deferred together with its ordered waiter list.
///
/// Generic over the waiter type so the event loop decides what a waiter
/// carries (handlers plus the derived chain link).
#[derive(Debug)]
pub struct Deferred<W> {
    state: DeferredState,
    waiters: Vec<W>,
    handled: bool,
    reported: bool,
}

impl<W> Default for Deferred<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Deferred<W> {
    pub fn new() -> Self {
        Self {
            state: DeferredState::Pending,
            waiters: Vec::new(),
            handled: false,
            reported: false,
        }
    }

    pub fn state(&self) -> &DeferredState {
        &self.state
    }

    /// Whether any waiter was ever registered.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    /// Transition into a terminal state.
    ///
    /// Returns the waiters to notify, in registration order, or `None` if
    /// the Deferred was already settled (the attempt is a no-op).
    pub fn settle(&mut self, settlement: Settlement) -> Option<Vec<W>> {
        if !self.state.is_pending() {
            return None;
        }
        self.state = settlement.into();
        Some(std::mem::take(&mut self.waiters))
    }

    /// Register a waiter.
    ///
    /// While pending the waiter is stored and `None` is returned; once
    /// settled the waiter is handed back with the settlement so the caller
    /// schedules its notification.
    pub fn register(&mut self, waiter: W) -> Option<(W, Settlement)> {
        self.handled = true;
        match self.state.settlement() {
            None => {
                self.waiters.push(waiter);
                None
            }
            Some(settlement) => Some((waiter, settlement)),
        }
    }

    /// Take the rejection reason if this Deferred is rejected, unhandled and
    /// not yet reported. Marks it reported.
    pub fn take_unobserved(&mut self) -> Option<Value> {
        match &self.state {
            DeferredState::Rejected(reason) if !self.handled && !self.reported => {
                self.reported = true;
                Some(reason.clone())
            }
            _ => None,
        }
    }
}
