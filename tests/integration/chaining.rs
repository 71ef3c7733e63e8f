//! Chain-link settlement rules.

use microloop::{Runtime, Value};

use crate::fixtures::{fulfilled, log_input, rejected, TestLoop};

/// Given a Deferred resolved with 1
/// When then returns 2, catch is skipped and a final then logs
/// Then the log is 1, 2 and the tail is fulfilled with undefined
#[test]
fn test_fulfilled_chain_skips_catch() {
    let mut t = TestLoop::new();
    let head = t.rt.create_deferred(|rt, r| {
        r.resolve(rt, 1);
        Ok(())
    });
    let a = t.rt.then(head, |rt, res| {
        rt.log(res.to_string());
        Ok(Value::from(2))
    });
    let b = t.rt.register_catch(a, |rt, _| {
        rt.log("catch ran");
        Ok(Value::from(3))
    });
    let tail = t.rt.then(b, log_input);

    t.run();

    assert_eq!(t.lines(), vec!["1", "2"]);
    assert_eq!(t.state(b), fulfilled(2));
    assert_eq!(t.state(tail), fulfilled(Value::Undefined));
}

/// Given a Deferred resolved with undefined
/// When the handler reads a property of it and throws
/// Then catch recovers with 3 and the next then logs 3
#[test]
fn test_thrown_error_is_caught_and_recovered() {
    let mut t = TestLoop::new();
    let head = t.rt.resolved(Value::Undefined);
    let a = t.rt.then(head, |rt, res| {
        let text = res.to_js_string()?;
        rt.log(text);
        Ok(Value::from(2))
    });
    let b = t.rt.register_catch(a, |_, _| Ok(Value::from(3)));
    t.rt.then(b, log_input);

    t.run();

    assert_eq!(t.lines(), vec!["3"]);
    assert_eq!(
        t.state(a),
        rejected(Value::type_error(
            "Cannot read properties of undefined (reading 'toString')"
        ))
    );
}

/// Returning (not throwing) an error object is a fulfillment.
#[test]
fn test_error_object_return_is_fulfillment() {
    let mut t = TestLoop::new();
    let head = t.rt.resolved(1);
    let a = t.rt.then(head, |_, _| Ok(Value::error("2")));
    let b = t.rt.register_catch(a, |rt, err| {
        rt.log("catch ran");
        Err(err)
    });
    t.rt.then(b, |rt, res| {
        assert!(res.is_error_like());
        rt.log(res.to_string());
        Ok(Value::Undefined)
    });

    t.run();

    assert_eq!(t.lines(), vec!["Error: 2"]);
    assert_eq!(t.state(a), fulfilled(Value::error("2")));
}

#[test]
fn test_rejection_passes_through_thens_to_catch() {
    let mut t = TestLoop::new();
    let head = t.rt.create_deferred(|_, _| Err(Value::error("1")));
    let a = t.rt.then(head, log_input);
    let b = t.rt.then(a, log_input);
    let c = t.rt.register_catch(b, |rt, err| {
        rt.log(format!("caught {}", err));
        Ok(Value::Undefined)
    });

    t.run();

    assert_eq!(t.lines(), vec!["caught Error: 1"]);
    assert_eq!(t.state(a), rejected(Value::error("1")));
    assert_eq!(t.state(b), rejected(Value::error("1")));
    assert_eq!(t.state(c), fulfilled(Value::Undefined));
}

#[test]
fn test_fulfillment_passes_through_catch() {
    let mut t = TestLoop::new();
    let head = t.rt.resolved("a");
    let link = t.rt.register_catch(head, |_, _| Ok(Value::from("b")));
    t.run();
    assert_eq!(t.state(link), fulfilled("a"));
    assert_eq!(t.rt.describe(link), "Promise { 'a' }");
}

#[test]
fn test_then_with_both_handlers_picks_rejection_handler() {
    let mut t = TestLoop::new();
    let head = t.rt.rejected(Value::from(7));
    let link = t.rt.register_then(
        head,
        Some(Box::new(|_: &mut Runtime, _: Value| Ok(Value::from("fulfilled")))),
        Some(Box::new(|_: &mut Runtime, reason: Value| {
            Ok(reason.plus(&Value::from(1)))
        })),
    );
    t.run();
    assert_eq!(t.state(link), fulfilled(8));
}

#[test]
fn test_first_settlement_wins() {
    let mut t = TestLoop::new();
    let p = t.rt.create_deferred(|rt, r| {
        r.reject(rt, Value::error("first"));
        r.resolve(rt, 1);
        r.reject(rt, Value::error("third"));
        Ok(())
    });
    t.rt.register_catch(p, |_, _| Ok(Value::Undefined));
    t.run();
    assert_eq!(t.state(p), rejected(Value::error("first")));
}

#[test]
fn test_multiple_waiters_each_notified_once() {
    let mut t = TestLoop::new();
    let p = t.rt.create_deferred(|rt, r| {
        rt.schedule_macrotask(move |rt| r.resolve(rt, "v"), 10);
        Ok(())
    });
    for i in 0..3 {
        t.rt.then(p, move |rt, v| {
            rt.log(format!("waiter {} got {}", i, v));
            Ok(Value::Undefined)
        });
    }
    t.run();
    // Registered after settlement, still notified exactly once.
    t.rt.then(p, |rt, v| {
        rt.log(format!("late got {}", v));
        Ok(Value::Undefined)
    });
    t.run();

    assert_eq!(
        t.lines(),
        vec!["waiter 0 got v", "waiter 1 got v", "waiter 2 got v", "late got v"]
    );
}
