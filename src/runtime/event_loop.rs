//! The event loop: Deferred registry, microtask queue and timer queue.
//!
//! All user code (executors, handlers, timer callbacks) receives
//! `&mut Runtime`, so it can print, create Deferreds, chain on them and
//! schedule further work. Nothing runs in parallel; every callback runs to
//! completion before the next task is popped.

use crate::config::Config;
use crate::core::{
    Completion, Deferred, DeferredId, DeferredState, MicrotaskQueue, Settlement, TaskKind,
    TimerQueue, Value,
};
use crate::error::{Error, Result};
use crate::runtime::console::Console;
use crate::runtime::report::{RunReport, UnobservedRejection};
use crate::{mlog, mlog_debug, mlog_error, mlog_trace, mlog_warn};

/// A `.then`/`.catch` handler. `Ok` is a normal return, `Err` a throw.
pub type Handler = Box<dyn FnOnce(&mut Runtime, Value) -> Completion>;

type Job = Box<dyn FnOnce(&mut Runtime)>;

/// One waiter on a Deferred: the handlers supplied at registration and the
/// chain link they settle.
struct Reaction {
    on_fulfilled: Option<Handler>,
    on_rejected: Option<Handler>,
    derived: DeferredId,
}

/// The settle capabilities handed to an executor.
///
/// Only the first `resolve`/`reject` on a Deferred has any effect. The pair
/// is `Copy` so it can be moved into timer callbacks, as executors that
/// resolve later do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolvers {
    deferred: DeferredId,
}

impl Resolvers {
    pub fn deferred(&self) -> DeferredId {
        self.deferred
    }

    /// # Panics
    ///
    /// Panics if `rt` is not the runtime that created this Deferred.
    pub fn resolve(&self, rt: &mut Runtime, value: impl Into<Value>) {
        rt.settle(self.deferred, Settlement::Fulfilled(value.into()));
    }

    /// # Panics
    ///
    /// Panics if `rt` is not the runtime that created this Deferred.
    pub fn reject(&self, rt: &mut Runtime, reason: impl Into<Value>) {
        rt.settle(self.deferred, Settlement::Rejected(reason.into()));
    }
}

pub struct Runtime {
    config: Config,
    console: Box<dyn Console>,
    deferreds: Vec<Deferred<Reaction>>,
    microtasks: MicrotaskQueue<Job>,
    timers: TimerQueue<Job>,
    /// Virtual clock, advanced to each timer's due time when it fires.
    now: u64,
}

impl Runtime {
    pub fn new(config: Config, console: Box<dyn Console>) -> Self {
        Self {
            config,
            console,
            deferreds: Vec::new(),
            microtasks: MicrotaskQueue::default(),
            timers: TimerQueue::default(),
            now: 0,
        }
    }

    /// A runtime with default configuration printing to `console`.
    pub fn with_console(console: impl Console + 'static) -> Self {
        Self::new(Config::default(), Box::new(console))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// `console.log` for user code.
    pub fn log(&mut self, line: impl AsRef<str>) {
        self.console.log(line.as_ref());
    }

    pub fn state(&self, id: DeferredId) -> Result<&DeferredState> {
        self.deferreds
            .get(id.0)
            .map(Deferred::state)
            .ok_or(Error::DeferredNotFound(id))
    }

    /// Node-style rendering of a Deferred, e.g. `Promise { <pending> }`.
    pub fn describe(&self, id: DeferredId) -> String {
        match self.state(id) {
            Ok(state) => state.to_string(),
            Err(_) => format!("<unknown deferred {}>", id),
        }
    }

    pub fn deferred_count(&self) -> usize {
        self.deferreds.len()
    }

    pub fn pending_microtasks(&self) -> usize {
        self.microtasks.len()
    }

    pub fn pending_macrotasks(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.timers.is_empty()
    }

    /// `new Promise(executor)`.
    ///
    /// The executor runs synchronously. If it throws, the Deferred rejects
    /// with the thrown value unless a capability already settled it.
    pub fn create_deferred<F>(&mut self, executor: F) -> DeferredId
    where
        F: FnOnce(&mut Runtime, Resolvers) -> Completion<()>,
    {
        let id = self.alloc();
        let resolvers = Resolvers { deferred: id };
        if let Err(thrown) = executor(self, resolvers) {
            mlog_debug!("executor for {} threw {}", id, thrown);
            resolvers.reject(self, thrown);
        }
        id
    }

    /// `Promise.resolve(value)`.
    pub fn resolved(&mut self, value: impl Into<Value>) -> DeferredId {
        let id = self.alloc();
        self.settle(id, Settlement::Fulfilled(value.into()));
        id
    }

    /// `Promise.reject(reason)`.
    pub fn rejected(&mut self, reason: impl Into<Value>) -> DeferredId {
        let id = self.alloc();
        self.settle(id, Settlement::Rejected(reason.into()));
        id
    }

    /// `deferred.then(on_fulfilled, on_rejected)`.
    ///
    /// Returns the chain link. The matching handler always runs in a later
    /// microtask, even when `deferred` is already settled; a missing handler
    /// passes the settlement through unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `deferred` was not created by this runtime.
    pub fn register_then(
        &mut self,
        deferred: DeferredId,
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
    ) -> DeferredId {
        let derived = self.alloc();
        let reaction = Reaction {
            on_fulfilled,
            on_rejected,
            derived,
        };
        mlog_debug!("register {} -> {}", deferred, derived);
        if let Some((reaction, settlement)) = self.deferreds[deferred.0].register(reaction) {
            self.schedule_reaction(reaction, settlement);
        }
        derived
    }

    /// `deferred.then(on_fulfilled)`.
    pub fn then<F>(&mut self, deferred: DeferredId, on_fulfilled: F) -> DeferredId
    where
        F: FnOnce(&mut Runtime, Value) -> Completion + 'static,
    {
        self.register_then(deferred, Some(Box::new(on_fulfilled)), None)
    }

    /// `deferred.catch(on_rejected)`.
    pub fn register_catch<F>(&mut self, deferred: DeferredId, on_rejected: F) -> DeferredId
    where
        F: FnOnce(&mut Runtime, Value) -> Completion + 'static,
    {
        self.register_then(deferred, None, Some(Box::new(on_rejected)))
    }

    /// `queueMicrotask(callback)`.
    pub fn queue_microtask<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Runtime) + 'static,
    {
        self.microtasks.enqueue(Box::new(callback));
    }

    /// `setTimeout(callback, delay)`: due at `now + delay`.
    pub fn schedule_macrotask<F>(&mut self, callback: F, delay: u64)
    where
        F: FnOnce(&mut Runtime) + 'static,
    {
        let due = self.now.saturating_add(delay);
        mlog_trace!("schedule {} due={}", TaskKind::Macrotask, due);
        self.timers.schedule(due, Box::new(callback));
    }

    /// Drive the loop until both queues are empty.
    ///
    /// Microtasks drain completely before each macrotask, including those
    /// queued while draining. Unobserved rejections are collected once the
    /// loop is idle. Running an idle loop again does nothing.
    pub fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::default();
        mlog!(
            "run start: {} microtasks, {} macrotasks queued",
            self.microtasks.len(),
            self.timers.len()
        );

        // The limit is checked while the next task is still queued, so a
        // run cut short leaves it for the next call.
        loop {
            while !self.microtasks.is_empty() {
                self.check_ticks(&report)?;
                let Some(job) = self.microtasks.pop() else {
                    break;
                };
                mlog_trace!("dispatch {} at t={}", TaskKind::Microtask, self.now);
                job(self);
                report.microtasks_run += 1;
            }

            if self.timers.is_empty() {
                break;
            }
            self.check_ticks(&report)?;
            let Some((due, job)) = self.timers.pop() else {
                break;
            };
            self.now = self.now.max(due);
            mlog_trace!("dispatch {} at t={}", TaskKind::Macrotask, self.now);
            job(self);
            report.macrotasks_run += 1;
        }

        if self.config.report_unobserved {
            report.unobserved = self.collect_unobserved();
        }
        report.clock = self.now;
        mlog!(
            "run finished: {} microtasks, {} macrotasks, t={}",
            report.microtasks_run,
            report.macrotasks_run,
            report.clock
        );
        Ok(report)
    }

    fn check_ticks(&self, report: &RunReport) -> Result<()> {
        let limit = self.config.max_ticks;
        if report.ticks() >= limit {
            mlog_error!("tick limit {} exceeded", limit);
            return Err(Error::TickLimitExceeded { limit });
        }
        Ok(())
    }

    fn alloc(&mut self) -> DeferredId {
        let id = DeferredId(self.deferreds.len());
        self.deferreds.push(Deferred::new());
        id
    }

    fn settle(&mut self, id: DeferredId, settlement: Settlement) {
        let Some(waiters) = self.deferreds[id.0].settle(settlement.clone()) else {
            mlog_trace!("{} already settled, ignoring", id);
            return;
        };
        mlog_debug!(
            "{} settled {}, notifying {} waiters",
            id,
            self.deferreds[id.0].state(),
            waiters.len()
        );
        for reaction in waiters {
            self.schedule_reaction(reaction, settlement.clone());
        }
    }

    fn schedule_reaction(&mut self, reaction: Reaction, settlement: Settlement) {
        self.microtasks
            .enqueue(Box::new(move |rt: &mut Runtime| rt.run_reaction(reaction, settlement)));
    }

    fn run_reaction(&mut self, reaction: Reaction, settlement: Settlement) {
        let Reaction {
            on_fulfilled,
            on_rejected,
            derived,
        } = reaction;

        let handler = match &settlement {
            Settlement::Fulfilled(_) => on_fulfilled,
            Settlement::Rejected(_) => on_rejected,
        };

        let outcome = match handler {
            Some(handler) => {
                let input = match settlement {
                    Settlement::Fulfilled(v) | Settlement::Rejected(v) => v,
                };
                Settlement::from(handler(self, input))
            }
            None => settlement,
        };
        self.settle(derived, outcome);
    }

    fn collect_unobserved(&mut self) -> Vec<UnobservedRejection> {
        let mut unobserved = Vec::new();
        for (index, deferred) in self.deferreds.iter_mut().enumerate() {
            if let Some(reason) = deferred.take_unobserved() {
                let id = DeferredId(index);
                mlog_warn!("unobserved rejection on {}: {}", id, reason);
                unobserved.push(UnobservedRejection {
                    deferred: id,
                    reason,
                });
            }
        }
        unobserved
    }
}
