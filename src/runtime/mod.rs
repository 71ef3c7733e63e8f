//! The Promise/task simulator.

pub mod console;
pub mod event_loop;
pub mod report;

pub use console::{Console, StdoutConsole, Transcript};
pub use event_loop::{Handler, Resolvers, Runtime};
pub use report::{RunReport, UnobservedRejection};
