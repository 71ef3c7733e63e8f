//! Core data model of the simulator.
//!
//! Values, Deferreds and the two task queues. Nothing in here knows about
//! handlers; the runtime composes these pieces into the event loop.

pub mod deferred;
pub mod task;
pub mod value;

pub use deferred::{Deferred, DeferredId, DeferredState, Settlement};
pub use task::{MicrotaskQueue, TaskKind, TimerQueue};
pub use value::{Completion, ErrorKind, ErrorObject, Value};
