//! Catalog of "what does this print?" exercises.
//!
//! Each scenario builds a program against a fresh [`Runtime`] (the build
//! function plays the role of the synchronous script body), runs the loop
//! and compares the console transcript and unobserved rejections with the
//! answer the exercise gives.

use serde::Serialize;

use crate::config::Config;
use crate::core::Value;
use crate::runtime::{RunReport, Runtime, Transcript};
use crate::{mlog, mlog_warn, Error, Result};

pub struct Scenario {
    pub name: &'static str,
    pub title: &'static str,
    /// Console lines, in order.
    pub expected: &'static [&'static str],
    /// Rendered reasons of rejections nobody observed.
    pub expected_unobserved: &'static [&'static str],
    build: fn(&mut Runtime),
}

/// What a scenario actually did.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub transcript: Vec<String>,
    pub report: RunReport,
}

impl ScenarioOutcome {
    /// Transcript followed by one `Uncaught (in promise)` line per
    /// unobserved rejection, the way Node prints them after the output.
    pub fn observed_lines(&self) -> Vec<String> {
        self.transcript
            .iter()
            .cloned()
            .chain(self.report.unobserved.iter().map(|u| u.to_string()))
            .collect()
    }
}

impl Scenario {
    pub fn expected_lines(&self) -> Vec<String> {
        self.expected
            .iter()
            .map(|line| line.to_string())
            .chain(
                self.expected_unobserved
                    .iter()
                    .map(|reason| format!("Uncaught (in promise) {}", reason)),
            )
            .collect()
    }

    /// Run the script body against `rt` without driving the loop.
    pub fn build_into(&self, rt: &mut Runtime) {
        (self.build)(rt);
    }

    pub fn run(&self, config: &Config) -> Result<ScenarioOutcome> {
        mlog!("scenario {} start", self.name);
        let transcript = Transcript::with_echo(config.echo_trace);
        let mut rt = Runtime::new(config.clone(), Box::new(transcript.clone()));
        self.build_into(&mut rt);
        let report = rt.run()?;
        Ok(ScenarioOutcome {
            name: self.name.to_string(),
            transcript: transcript.lines(),
            report,
        })
    }

    /// Run and compare against the expected answer.
    pub fn check(&self, config: &Config) -> Result<ScenarioOutcome> {
        let config = Config {
            report_unobserved: true,
            ..config.clone()
        };
        let outcome = self.run(&config)?;
        let expected = self.expected_lines();
        let actual = outcome.observed_lines();
        if expected != actual {
            mlog_warn!("scenario {} mismatch", self.name);
            return Err(Error::ScenarioMismatch {
                name: self.name.to_string(),
                expected,
                actual,
            });
        }
        Ok(outcome)
    }
}

pub fn catalog() -> &'static [Scenario] {
    CATALOG
}

pub fn find(name: &str) -> Result<&'static Scenario> {
    CATALOG
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| Error::ScenarioNotFound(name.to_string()))
}

const CATALOG: &[Scenario] = &[
    Scenario {
        name: "chain-timer",
        title: "Links of a chain stay pending until a timer resolves the head",
        expected: &[
            "Promise { <pending> } Promise { <pending> } Promise { <pending> }",
            "1",
            "2",
            "Promise { 1 } Promise { 2 } Promise { undefined }",
        ],
        expected_unobserved: &[],
        build: chain_timer,
    },
    Scenario {
        name: "then-catch-then",
        title: "Fulfilled chain skips the catch",
        expected: &["1", "2"],
        expected_unobserved: &[],
        build: then_catch_then,
    },
    Scenario {
        name: "throw-in-then",
        title: "A TypeError thrown in a handler is recovered by catch",
        expected: &["3"],
        expected_unobserved: &[],
        build: throw_in_then,
    },
    Scenario {
        name: "error-as-value",
        title: "Returning an Error object fulfills the next link",
        expected: &["1", "Error: 2"],
        expected_unobserved: &[],
        build: error_as_value,
    },
    Scenario {
        name: "executor-throws",
        title: "Executor throw passes through then, is rethrown by catch",
        expected: &[],
        expected_unobserved: &["Error: 1"],
        build: executor_throws,
    },
    Scenario {
        name: "rejected-by-timer",
        title: "A timer rejects the head; catch recovers with 2",
        expected: &[
            "promise1 Promise { <pending> }",
            "promise2 Promise { <pending> }",
            "promise1 Promise { <rejected>: undefined }",
            "promise2 Promise { 2 }",
        ],
        expected_unobserved: &[],
        build: rejected_by_timer,
    },
    Scenario {
        name: "inspect-after-drain",
        title: "The tail of a drained chain is fulfilled with undefined",
        expected: &["1", "2", "Promise { undefined }"],
        expected_unobserved: &[],
        build: inspect_after_drain,
    },
    Scenario {
        name: "inspect-after-recovery",
        title: "A recovered chain ends fulfilled with undefined",
        expected: &["3", "Promise { undefined }"],
        expected_unobserved: &[],
        build: inspect_after_recovery,
    },
    Scenario {
        name: "throw-in-timer-chain",
        title: "A throw after a timer resolution skips the rest of the chain",
        expected: &[],
        expected_unobserved: &["3"],
        build: throw_in_timer_chain,
    },
];

fn log_value(rt: &mut Runtime, value: Value) -> crate::core::Completion {
    rt.log(value.to_string());
    Ok(Value::Undefined)
}

fn chain_timer(rt: &mut Runtime) {
    let pro1 = rt.create_deferred(|rt, resolvers| {
        rt.schedule_macrotask(move |rt| resolvers.resolve(rt, 1), 1000);
        Ok(())
    });
    let pro2 = rt.then(pro1, |rt, data| {
        rt.log(data.to_string());
        Ok(data.plus(&Value::from(1)))
    });
    let pro3 = rt.then(pro2, log_value);

    let line = format!(
        "{} {} {}",
        rt.describe(pro1),
        rt.describe(pro2),
        rt.describe(pro3)
    );
    rt.log(line);

    rt.schedule_macrotask(
        move |rt| {
            let line = format!(
                "{} {} {}",
                rt.describe(pro1),
                rt.describe(pro2),
                rt.describe(pro3)
            );
            rt.log(line);
        },
        2000,
    );
}

fn then_catch_then(rt: &mut Runtime) {
    let p = rt.create_deferred(|rt, resolvers| {
        resolvers.resolve(rt, 1);
        Ok(())
    });
    let p = rt.then(p, |rt, res| {
        rt.log(res.to_string());
        Ok(Value::from(2))
    });
    let p = rt.register_catch(p, |_, _| Ok(Value::from(3)));
    rt.then(p, log_value);
}

fn throw_in_then(rt: &mut Runtime) {
    let p = rt.create_deferred(|rt, resolvers| {
        resolvers.resolve(rt, Value::Undefined);
        Ok(())
    });
    let p = rt.then(p, |rt, res| {
        let text = res.to_js_string()?;
        rt.log(text);
        Ok(Value::from(2))
    });
    let p = rt.register_catch(p, |_, _| Ok(Value::from(3)));
    rt.then(p, log_value);
}

fn error_as_value(rt: &mut Runtime) {
    let p = rt.create_deferred(|rt, resolvers| {
        resolvers.resolve(rt, 1);
        Ok(())
    });
    let p = rt.then(p, |rt, res| {
        rt.log(res.to_string());
        Ok(Value::error("2"))
    });
    let p = rt.register_catch(p, |_, err| Err(err));
    rt.then(p, log_value);
}

fn executor_throws(rt: &mut Runtime) {
    let p = rt.create_deferred(|_, _| Err(Value::error("1")));
    let p = rt.then(p, |rt, res| {
        rt.log(res.to_string());
        Ok(Value::error("2"))
    });
    let p = rt.register_catch(p, |_, err| Err(err));
    rt.then(p, log_value);
}

fn rejected_by_timer(rt: &mut Runtime) {
    let promise1 = rt.create_deferred(|rt, resolvers| {
        rt.schedule_macrotask(move |rt| resolvers.reject(rt, Value::Undefined), 1000);
        Ok(())
    });
    let promise2 = rt.register_catch(promise1, |_, _| Ok(Value::from(2)));

    let line = format!("promise1 {}", rt.describe(promise1));
    rt.log(line);
    let line = format!("promise2 {}", rt.describe(promise2));
    rt.log(line);

    rt.schedule_macrotask(
        move |rt| {
            let line = format!("promise1 {}", rt.describe(promise1));
            rt.log(line);
            let line = format!("promise2 {}", rt.describe(promise2));
            rt.log(line);
        },
        2000,
    );
}

fn inspect_after_drain(rt: &mut Runtime) {
    let p = rt.resolved(1);
    let p = rt.then(p, |rt, res| {
        rt.log(res.to_string());
        Ok(Value::from(2))
    });
    let p = rt.register_catch(p, |_, _| Ok(Value::from(3)));
    let pro = rt.then(p, log_value);
    rt.schedule_macrotask(
        move |rt| {
            let line = rt.describe(pro);
            rt.log(line);
        },
        1000,
    );
}

fn inspect_after_recovery(rt: &mut Runtime) {
    let p = rt.resolved(Value::Undefined);
    let p = rt.then(p, |rt, res| {
        let text = res.to_js_string()?;
        rt.log(text);
        Ok(Value::from(2))
    });
    let p = rt.register_catch(p, |_, _| Ok(Value::from(3)));
    let pro = rt.then(p, log_value);
    rt.schedule_macrotask(
        move |rt| {
            let line = rt.describe(pro);
            rt.log(line);
        },
        1000,
    );
}

fn throw_in_timer_chain(rt: &mut Runtime) {
    let p = rt.create_deferred(|rt, resolvers| {
        rt.schedule_macrotask(move |rt| resolvers.resolve(rt, 1), 1000);
        Ok(())
    });
    let p = rt.then(p, |_, _| Err(Value::from(3)));
    rt.then(p, log_value);
}
