//! Console capability injected into the runtime.
//!
//! Handlers never print directly; they call [`crate::runtime::Runtime::log`],
//! which forwards to whatever console the host supplied.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

pub trait Console {
    fn log(&mut self, line: &str);
}

/// Records every line in order. Clones share the same buffer, so a host can
/// keep one handle while the runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
    echo: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also print each line to stdout as it is recorded.
    pub fn with_echo(echo: bool) -> Self {
        Self {
            lines: Rc::default(),
            echo,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}

impl Console for Transcript {
    fn log(&mut self, line: &str) {
        if self.echo {
            println!("{}", line);
        }
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Writes straight to stdout.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn log(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }
}
