//! Microtask / macrotask ordering.

use std::cell::RefCell;
use std::rc::Rc;

use microloop::{DeferredState, Value};

use crate::fixtures::{fulfilled, log_input, rejected, TestLoop};

/// Handlers never run inside the call that registers them.
#[test]
fn test_registration_precedes_execution() {
    let mut t = TestLoop::new();
    let p = t.rt.resolved(1);
    t.rt.log("before then");
    t.rt.then(p, log_input);
    t.rt.log("after then");
    assert_eq!(t.rt.pending_microtasks(), 1);

    t.run();

    assert_eq!(t.lines(), vec!["before then", "after then", "1"]);
}

/// Given a head resolved by a 1000-unit timer and a catch recovering a
/// rejection from a second head
/// When observed by a 999-unit timer and a 2000-unit timer
/// Then every link is pending at 999 and settled at 2000
#[test]
fn test_links_pending_until_timer_fires() {
    let mut t = TestLoop::new();
    let ok_head = t.rt.create_deferred(|rt, r| {
        rt.schedule_macrotask(move |rt| r.resolve(rt, 1), 1000);
        Ok(())
    });
    let ok_link = t.rt.then(ok_head, |_, v| Ok(v.plus(&Value::from(1))));
    let err_head = t.rt.create_deferred(|rt, r| {
        rt.schedule_macrotask(move |rt| r.reject(rt, Value::Undefined), 1000);
        Ok(())
    });
    let err_link = t.rt.register_catch(err_head, |_, _| Ok(Value::from(2)));
    let ids = [ok_head, ok_link, err_head, err_link];

    let early: Rc<RefCell<Vec<DeferredState>>> = Rc::default();
    let late: Rc<RefCell<Vec<DeferredState>>> = Rc::default();
    {
        let early = Rc::clone(&early);
        t.rt.schedule_macrotask(
            move |rt| {
                for id in ids {
                    early.borrow_mut().push(rt.state(id).unwrap().clone());
                }
            },
            999,
        );
    }
    {
        let late = Rc::clone(&late);
        t.rt.schedule_macrotask(
            move |rt| {
                for id in ids {
                    late.borrow_mut().push(rt.state(id).unwrap().clone());
                }
            },
            2000,
        );
    }

    // Before the loop runs at all, nothing has settled.
    for id in ids {
        assert!(t.state(id).is_pending());
    }

    let report = t.run();

    assert!(early.borrow().iter().all(DeferredState::is_pending));
    assert_eq!(
        *late.borrow(),
        vec![
            fulfilled(1),
            fulfilled(2),
            rejected(Value::Undefined),
            fulfilled(2)
        ]
    );
    assert_eq!(report.clock, 2000);
    assert!(report.unobserved.is_empty());
}

/// Microtasks queued by a settlement inside a timer all run before the
/// next timer, even one due at the same time.
#[test]
fn test_settlement_microtasks_run_before_next_timer() {
    let mut t = TestLoop::new();
    let p = t.rt.create_deferred(|rt, r| {
        rt.schedule_macrotask(
            move |rt| {
                rt.log("timer A");
                r.resolve(rt, "x");
            },
            5,
        );
        Ok(())
    });
    let a = t.rt.then(p, |rt, v| {
        rt.log(format!("then 1 {}", v));
        Ok(v)
    });
    t.rt.then(a, |rt, v| {
        rt.log(format!("then 2 {}", v));
        Ok(v)
    });
    t.rt.schedule_macrotask(|rt| rt.log("timer B"), 5);

    let report = t.run();

    assert_eq!(
        t.lines(),
        vec!["timer A", "then 1 x", "then 2 x", "timer B"]
    );
    assert_eq!(report.macrotasks_run, 2);
    assert_eq!(report.microtasks_run, 2);
}

#[test]
fn test_chains_interleave_one_link_per_tick() {
    let mut t = TestLoop::new();
    let a = t.rt.resolved("a");
    let b = t.rt.resolved("b");
    let a1 = t.rt.then(a, |rt, _| {
        rt.log("a1");
        Ok(Value::Undefined)
    });
    let b1 = t.rt.then(b, |rt, _| {
        rt.log("b1");
        Ok(Value::Undefined)
    });
    t.rt.then(a1, |rt, _| {
        rt.log("a2");
        Ok(Value::Undefined)
    });
    t.rt.then(b1, |rt, _| {
        rt.log("b2");
        Ok(Value::Undefined)
    });

    t.run();

    assert_eq!(t.lines(), vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn test_queue_microtask_runs_before_zero_delay_timer() {
    let mut t = TestLoop::new();
    t.rt.schedule_macrotask(|rt| rt.log("timeout"), 0);
    t.rt.queue_microtask(|rt| rt.log("microtask"));
    t.rt.log("sync");
    t.run();
    assert_eq!(t.lines(), vec!["sync", "microtask", "timeout"]);
}

/// Re-running a drained loop prints nothing and changes nothing.
#[test]
fn test_rerun_after_drain_is_idempotent() {
    let mut t = TestLoop::new();
    let head = t.rt.create_deferred(|_, _| Err(Value::error("boom")));
    let tail = t.rt.then(head, log_input);
    let ok = t.rt.resolved(1);
    t.rt.then(ok, log_input);

    let first = t.run();
    let lines = t.lines();
    let states: Vec<_> = [head, tail, ok].iter().map(|&id| t.state(id)).collect();
    assert!(!first.is_quiet());
    assert!(t.rt.is_idle());

    let second = t.run();

    assert!(second.is_quiet());
    assert_eq!(second.clock, first.clock);
    assert_eq!(t.lines(), lines);
    let after: Vec<_> = [head, tail, ok].iter().map(|&id| t.state(id)).collect();
    assert_eq!(after, states);
}
