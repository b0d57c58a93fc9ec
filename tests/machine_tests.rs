//! Behavioral tests for the machine's receive protocol.

use futures::FutureExt;
use machina::{Event, GuardFault, Machine, Middleware, PlainState, Rejection, Transition};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct TestState {
    name: String,
    entered: AtomicUsize,
    left: AtomicUsize,
}

impl TestState {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(TestState {
            name: name.to_string(),
            entered: AtomicUsize::new(0),
            left: AtomicUsize::new(0),
        })
    }

    fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    fn left(&self) -> usize {
        self.left.load(Ordering::SeqCst)
    }
}

impl machina::State for TestState {
    fn name(&self) -> &str {
        &self.name
    }

    fn enter(&self, _prev: &dyn machina::State, _event: &Event) {
        self.entered.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self, _event: &Event) {
        self.left.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn switches_state_on_event_without_guard() {
    let state1 = TestState::new("state1");
    let state2 = TestState::new("state2");
    let machine = Machine::new("state1", vec![Transition::new("state1", "go", "state2")]);
    machine.add_state(state1.clone());
    machine.add_state(state2.clone());

    assert_eq!(machine.current_state().unwrap().name(), "state1");
    machine.receive(Event::new("go")).await;

    assert_eq!(machine.current_state().unwrap().name(), "state2");
    assert_eq!(state1.left(), 1);
    assert_eq!(state2.entered(), 1);
}

#[test]
fn unguarded_transition_commits_without_suspension() {
    let machine = Machine::new("state1", vec![Transition::new("state1", "go", "state2")]);
    machine.add_state(TestState::new("state1"));
    machine.add_state(TestState::new("state2"));

    // No middleware means no suspension point: a single poll completes.
    machine
        .receive(Event::new("go"))
        .now_or_never()
        .expect("attempt should finish in one poll");

    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn switches_state_when_guard_is_fulfilled() {
    let state1 = TestState::new("state1");
    let state2 = TestState::new("state2");
    let machine = Machine::new(
        "state1",
        vec![Transition::named("go-2", "state1", "go", "state2")],
    );
    machine.add_state(state1.clone());
    machine.add_state(state2.clone());
    machine.add_middleware(
        "go-2",
        Middleware::predicate(|event| {
            event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true)
        }),
    );

    machine
        .receive(Event::with_detail("go", json!({ "allow": false })))
        .await;
    assert_eq!(machine.current_state().unwrap().name(), "state1");
    assert_eq!(state1.left(), 0);

    machine
        .receive(Event::with_detail("go", json!({ "allow": true })))
        .await;
    assert_eq!(machine.current_state().unwrap().name(), "state2");
    assert_eq!(state1.left(), 1);
    assert_eq!(state2.entered(), 1);
}

#[tokio::test]
async fn handles_async_guard_correctly() {
    let state1 = TestState::new("state1");
    let state3 = TestState::new("state3");
    let machine = Machine::new(
        "state1",
        vec![Transition::named("async-go", "state1", "asyncGo", "state3")],
    );
    machine.add_state(state1.clone());
    machine.add_state(state3.clone());
    machine.add_middleware(
        "async-go",
        Middleware::new(|next, event, _current, _target| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let allow = event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true);
                next.resolve(allow, None).await
            })
        }),
    );

    machine
        .receive(Event::with_detail("asyncGo", json!({ "allow": false })))
        .await;
    assert_eq!(machine.current_state().unwrap().name(), "state1");
    assert_eq!(state1.left(), 0);

    machine
        .receive(Event::with_detail("asyncGo", json!({ "allow": true })))
        .await;
    assert_eq!(machine.current_state().unwrap().name(), "state3");
    assert_eq!(state1.left(), 1);
    assert_eq!(state3.entered(), 1);
}

#[tokio::test]
async fn transitioning_is_set_while_in_progress() {
    let machine = Arc::new(Machine::new(
        "state1",
        vec![Transition::named("slow", "state1", "go", "state2")],
    ));
    machine.add_state(TestState::new("state1"));
    machine.add_state(TestState::new("state2"));
    machine.add_middleware(
        "slow",
        Middleware::new(|next, _event, _current, _target| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                next.proceed().await
            })
        }),
    );

    assert!(!machine.transitioning());
    let handle = tokio::spawn({
        let machine = Arc::clone(&machine);
        async move { machine.receive(Event::new("go")).await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(machine.transitioning());

    handle.await.unwrap();
    assert!(!machine.transitioning());
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn events_arriving_while_in_flight_are_dropped() {
    let machine = Arc::new(Machine::new(
        "state1",
        vec![
            Transition::named("slow", "state1", "go", "state2"),
            Transition::new("state1", "jump", "state3"),
        ],
    ));
    machine.add_state(TestState::new("state1"));
    machine.add_middleware(
        "slow",
        Middleware::new(|next, _event, _current, _target| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                next.proceed().await
            })
        }),
    );

    let handle = tokio::spawn({
        let machine = Arc::clone(&machine);
        async move { machine.receive(Event::new("go")).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Resolves immediately: the in-flight attempt wins and "jump" vanishes.
    machine.receive(Event::new("jump")).await;

    handle.await.unwrap();
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn wrong_event_is_absorbed_and_later_events_still_work() {
    let state1 = TestState::new("state1");
    let machine = Machine::new("state1", vec![Transition::new("state1", "go", "state2")]);
    machine.add_state(state1.clone());

    machine.receive(Event::new("wrong")).await;
    assert_eq!(machine.current_state().unwrap().name(), "state1");
    assert!(!machine.transitioning());
    assert_eq!(state1.left(), 0);

    machine.receive(Event::new("go")).await;
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn guards_run_in_order_with_commit_before_post_work() {
    let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    struct Recording {
        log: Arc<Mutex<Vec<u32>>>,
    }

    impl machina::State for Recording {
        fn name(&self) -> &str {
            "state2"
        }

        fn enter(&self, _prev: &dyn machina::State, _event: &Event) {
            self.log.lock().push(99);
        }
    }

    let machine = Machine::new(
        "state1",
        vec![Transition::named("marked", "state1", "go", "state2")],
    );
    machine.add_state(TestState::new("state1"));
    machine.add_state(Arc::new(Recording {
        log: Arc::clone(&log),
    }));

    // First guard records around its next() call, the others only before.
    let around = {
        let log = Arc::clone(&log);
        Middleware::new(move |next, _event, _current, _target| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().push(1);
                let outcome = next.proceed().await;
                log.lock().push(4);
                outcome
            })
        })
    };
    machine.add_middleware("marked", around);
    for marker in [2u32, 3] {
        let log = Arc::clone(&log);
        machine.add_middleware(
            "marked",
            Middleware::new(move |next, _event, _current, _target| {
                log.lock().push(marker);
                next.proceed()
            }),
        );
    }

    machine.receive(Event::new("go")).await;

    assert_eq!(*log.lock(), vec![1, 2, 3, 99, 4]);
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn veto_is_recorded_and_cleared_by_the_next_success() {
    let machine = Machine::new(
        "state1",
        vec![Transition::named("gated", "state1", "go", "state2")],
    );
    machine.add_state(TestState::new("state1"));

    let deny = Middleware::new(|next, event, _current, _target| {
        let allowed = event.detail_field("allow").and_then(|v| v.as_bool()) == Some(true);
        if allowed {
            next.proceed()
        } else {
            next.reject(json!({ "reason": "not allowed" }))
        }
    });
    machine.add_middleware("gated", deny.clone());

    machine.receive(Event::new("go")).await;

    let rejection = machine.rejection().expect("veto should be recorded");
    assert!(rejection.is_veto());
    assert!(Middleware::ptr_eq(rejection.middleware(), &deny));
    assert_eq!(rejection.detail(), Some(&json!({ "reason": "not allowed" })));
    assert_eq!(machine.current_state().unwrap().name(), "state1");

    machine
        .receive(Event::with_detail("go", json!({ "allow": true })))
        .await;
    assert!(machine.rejection().is_none());
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn faulting_guard_leaves_the_machine_usable() {
    let state1 = TestState::new("state1");
    let machine = Machine::new(
        "state1",
        vec![Transition::named("flaky", "state1", "go", "state2")],
    );
    machine.add_state(state1.clone());

    let attempts = Arc::new(AtomicUsize::new(0));
    let failing = Middleware::named("backend-check", {
        let attempts = Arc::clone(&attempts);
        move |next, _event, _current, _target| {
            let first = attempts.fetch_add(1, Ordering::SeqCst) == 0;
            if first {
                Box::pin(async { Err(GuardFault::msg("backend unavailable")) })
            } else {
                next.proceed()
            }
        }
    });
    machine.add_middleware("flaky", failing.clone());

    machine.receive(Event::new("go")).await;

    // The fault is reported as a rejection kind of its own, the state is
    // untouched, and the in-flight flag is back down.
    let rejection = machine.rejection().expect("fault should be recorded");
    assert!(rejection.is_fault());
    assert!(Middleware::ptr_eq(rejection.middleware(), &failing));
    match rejection {
        Rejection::Fault { fault, .. } => {
            assert_eq!(fault.to_string(), "backend unavailable");
        }
        other => panic!("expected fault, got {other:?}"),
    }
    assert_eq!(machine.current_state().unwrap().name(), "state1");
    assert_eq!(state1.left(), 0);
    assert!(!machine.transitioning());

    // A later attempt on the same machine still goes through.
    machine.receive(Event::new("go")).await;
    assert!(machine.rejection().is_none());
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn lazily_materialized_target_is_a_plain_state() {
    let machine = Machine::new("state1", vec![Transition::new("state1", "go", "state2")]);
    machine.add_state(Arc::new(PlainState::new("state1")));

    machine.receive(Event::new("go")).await;

    let current = machine.current_state().unwrap();
    assert_eq!(current.name(), "state2");
}

#[tokio::test]
async fn with_states_registers_and_adopts_in_bulk() {
    let machine = Machine::with_states(
        "state1",
        vec![Transition::new("state1", "go", "state2")],
        vec![
            Arc::new(PlainState::new("state1")),
            Arc::new(PlainState::new("state2")),
        ],
    );

    assert_eq!(machine.current_state().unwrap().name(), "state1");
    machine.receive(Event::new("go")).await;
    assert_eq!(machine.current_state().unwrap().name(), "state2");
}

#[tokio::test]
async fn hooks_fire_once_per_commit_across_a_round_trip() {
    let state1 = TestState::new("state1");
    let state2 = TestState::new("state2");
    let machine = Machine::with_states(
        "state1",
        vec![
            Transition::new("state1", "go", "state2"),
            Transition::new("state2", "back", "state1"),
        ],
        vec![state1.clone(), state2.clone()],
    );

    machine.receive(Event::new("go")).await;
    machine.receive(Event::new("back")).await;

    assert_eq!(state1.left(), 1);
    assert_eq!(state2.entered(), 1);
    assert_eq!(state2.left(), 1);
    assert_eq!(state1.entered(), 1);
    assert_eq!(machine.current_state().unwrap().name(), "state1");
}
