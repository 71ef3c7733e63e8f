//! Unobserved rejection reporting.

use microloop::config::Config;
use microloop::runtime::UnobservedRejection;
use microloop::Value;

use crate::fixtures::{log_input, TestLoop};

#[test]
fn test_only_the_unhandled_tail_is_reported() {
    let mut t = TestLoop::new();
    let head = t.rt.create_deferred(|_, _| Err(Value::error("1")));
    let a = t.rt.then(head, |_, _| Ok(Value::error("2")));
    let b = t.rt.register_catch(a, |_, err| Err(err));
    let tail = t.rt.then(b, log_input);

    let report = t.run();

    assert!(t.lines().is_empty());
    assert_eq!(
        report.unobserved,
        vec![UnobservedRejection {
            deferred: tail,
            reason: Value::error("1"),
        }]
    );
}

#[test]
fn test_caught_rejection_is_not_reported() {
    let mut t = TestLoop::new();
    let head = t.rt.create_deferred(|rt, r| {
        rt.schedule_macrotask(move |rt| r.reject(rt, Value::Undefined), 1000);
        Ok(())
    });
    t.rt.register_catch(head, |_, _| Ok(Value::from(2)));

    let report = t.run();
    assert!(report.unobserved.is_empty());
}

#[test]
fn test_bare_rejected_deferred_is_reported_once() {
    let mut t = TestLoop::new();
    let p = t.rt.rejected(Value::from(3));

    let first = t.run();
    assert_eq!(first.unobserved.len(), 1);
    assert_eq!(first.unobserved[0].deferred, p);
    assert_eq!(
        first.unobserved[0].to_string(),
        "Uncaught (in promise) 3"
    );

    assert!(t.run().unobserved.is_empty());
}

/// A rejection thrown while recovering inside catch is a new rejection.
#[test]
fn test_rethrow_in_catch_reports_new_tail() {
    let mut t = TestLoop::new();
    let head = t.rt.rejected(Value::error("first"));
    let recovered = t.rt.register_catch(head, |_, _| Err(Value::type_error("second")));

    let report = t.run();
    assert_eq!(report.unobserved.len(), 1);
    assert_eq!(report.unobserved[0].deferred, recovered);
    assert_eq!(report.unobserved[0].reason, Value::type_error("second"));
}

#[test]
fn test_reporting_disabled_by_config() {
    let config = Config {
        report_unobserved: false,
        ..Config::default()
    };
    let mut t = TestLoop::with_config(config);
    t.rt.create_deferred(|_, _| Err(Value::Undefined));
    assert!(t.run().unobserved.is_empty());
}

#[test]
fn test_report_serializes_to_json() {
    let mut t = TestLoop::new();
    t.rt.rejected(Value::Undefined);
    let report = t.run();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["unobserved"][0]["deferred"], 0);
    assert_eq!(json["unobserved"][0]["reason"]["type"], "undefined");
}
