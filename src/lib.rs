pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod runtime;
pub mod scenarios;

pub use crate::core::{Completion, DeferredId, DeferredState, Settlement, Value};
pub use error::{Error, Result};
pub use runtime::{Console, Resolvers, RunReport, Runtime, Transcript};
