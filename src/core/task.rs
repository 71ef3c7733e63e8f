//! Task queues driving the event loop.
//!
//! Microtasks are strictly FIFO. Macrotasks are ordered by due time on the
//! virtual clock, FIFO among equal due times.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Which queue a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Microtask,
    Macrotask,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Microtask => write!(f, "microtask"),
            TaskKind::Macrotask => write!(f, "macrotask"),
        }
    }
}

pub struct MicrotaskQueue<T> {
    queue: VecDeque<T>,
}

impl<T> Default for MicrotaskQueue<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<T> MicrotaskQueue<T> {
    pub fn enqueue(&mut self, task: T) {
        self.queue.push_back(task);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Timer queue keyed by `(due, sequence)`.
pub struct TimerQueue<T> {
    timers: BTreeMap<(u64, u64), T>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule(&mut self, due: u64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert((due, seq), task);
    }

    /// Remove the earliest timer, returning its due time.
    pub fn pop(&mut self) -> Option<(u64, T)> {
        self.timers.pop_first().map(|((due, _), task)| (due, task))
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
