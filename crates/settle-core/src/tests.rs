#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::future;

    use crate::prelude::*;

    fn pool_and_spawner() -> (LocalPool, Rc<dyn Spawner>) {
        let pool = LocalPool::new();
        let spawner: Rc<dyn Spawner> = Rc::new(pool.spawner());
        (pool, spawner)
    }

    /// An operation the test settles by hand.
    fn deferred<T: 'static>() -> (
        oneshot::Sender<Result<T, String>>,
        impl std::future::Future<Output = Result<T, String>>,
    ) {
        let (tx, rx) = oneshot::channel();
        let fut = async move { rx.await.unwrap_or_else(|_| Err("cancelled".to_string())) };
        (tx, fut)
    }

    #[test]
    fn signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn signal_subscription() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        let reader = sig.clone();
        let id = sig.subscribe(move |v| {
            // subscribers may read the signal they observe
            assert_eq!(reader.get(), *v);
            seen_clone.borrow_mut().push(*v);
        });

        sig.set(42);
        assert!(sig.unsubscribe(id));
        sig.set(7);

        assert_eq!(*seen.borrow(), vec![42]);
        assert!(!sig.unsubscribe(id));
    }

    #[test]
    fn signal_write_from_subscriber_is_applied_after_the_round() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let writer = sig.clone();
        sig.subscribe(move |v| {
            if *v < 3 {
                writer.set(*v + 1);
            }
        });
        let seen_clone = seen.clone();
        let reader = sig.clone();
        sig.subscribe(move |v| {
            // the queued write has not landed yet
            assert_eq!(reader.get(), *v);
            seen_clone.borrow_mut().push(*v);
        });

        sig.set(1);

        assert_eq!(sig.get(), 3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn signal_subscriptions_can_change_during_notification() {
        let sig = signal(0);
        let calls = Rc::new(RefCell::new(0));

        let handle = sig.clone();
        let late_calls = calls.clone();
        let id = Rc::new(RefCell::new(None));
        let own_id = id.clone();
        let first = sig.subscribe(move |_| {
            let late_calls = late_calls.clone();
            handle.subscribe(move |_| *late_calls.borrow_mut() += 1);
            if let Some(me) = own_id.borrow_mut().take() {
                assert!(handle.unsubscribe(me));
            }
        });
        *id.borrow_mut() = Some(first);

        sig.set(1);
        assert_eq!(*calls.borrow(), 0);
        sig.set(2);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn scope_cleanup_on_drop() {
        let cleaned_up = Rc::new(RefCell::new(false));

        {
            let scope = Scope::new();
            let cleaned_up_clone = cleaned_up.clone();
            scope.add_disposer(move || {
                *cleaned_up_clone.borrow_mut() = true;
            });

            assert!(!*cleaned_up.borrow());
        }

        assert!(*cleaned_up.borrow());
    }

    #[test]
    fn scope_explicit_dispose_runs_once() {
        let runs = Rc::new(RefCell::new(Vec::new()));

        let scope = Scope::new();
        let child = scope.child();
        {
            let runs = runs.clone();
            scope.add_disposer(move || runs.borrow_mut().push("parent"));
        }
        {
            let runs = runs.clone();
            child.add_disposer(move || runs.borrow_mut().push("child"));
        }

        scope.dispose();
        scope.dispose();
        drop(scope);

        assert_eq!(*runs.borrow(), vec!["child", "parent"]);
        assert!(child.is_disposed());
    }

    #[test]
    fn disposer_on_disposed_scope_runs_immediately() {
        let scope = Scope::new();
        scope.dispose();

        let ran = Rc::new(RefCell::new(false));
        let ran2 = ran.clone();
        scope.add_disposer(move || *ran2.borrow_mut() = true);
        assert!(*ran.borrow());
    }

    #[test]
    fn active_scope_closes_once() {
        let active = ActiveScope::open();
        let handle = active.clone();
        assert!(handle.is_open());

        assert!(active.close());
        assert!(!active.close());
        assert!(!handle.is_open());
    }

    #[test]
    fn effect_registers_in_current_scope() {
        let scope = Scope::new();
        let cleaned = Rc::new(RefCell::new(0));

        let d = scope.run(|| {
            let cleaned = cleaned.clone();
            effect(move || on_unmount(move || *cleaned.borrow_mut() += 1))
        });

        assert!(!d.is_spent());
        scope.dispose();
        assert!(d.is_spent());
        d.run();
        assert_eq!(*cleaned.borrow(), 1);
    }

    #[test]
    fn key_based_remember() {
        let composition = Composition::new();

        let (val1, val2) = composition.compose(|| {
            (
                remember_with_key("test", || 42),
                remember_with_key("test", || 100),
            )
        });

        // Same instance: the key already existed.
        assert_eq!(*val1, 42);
        assert_eq!(*val2, 42);
    }

    #[test]
    fn slot_remember_survives_recomposition() {
        let composition = Composition::new();
        let body = || {
            let count = remember_state(|| 0);
            *count.borrow_mut() += 1;
            let value = *count.borrow();
            value
        };

        assert_eq!(composition.compose(body), 1);
        assert_eq!(composition.compose(body), 2);
        assert_eq!(composition.slot_count(), 1);

        composition.dispose();
        assert_eq!(composition.slot_count(), 0);
        assert_eq!(composition.compose(body), 1);
    }

    #[test]
    fn disposable_effect_reruns_on_key_change() {
        let composition = Composition::new();
        let log = Rc::new(RefCell::new(Vec::<String>::new()));

        let body = |key: &'static str| {
            let log = log.clone();
            move || {
                let log = log.clone();
                disposable_effect(key, move || {
                    log.borrow_mut().push(format!("start {key}"));
                    on_unmount(move || log.borrow_mut().push(format!("stop {key}")))
                });
            }
        };

        composition.compose(body("a"));
        composition.compose(body("a"));
        composition.compose(body("b"));
        composition.dispose();

        assert_eq!(
            *log.borrow(),
            vec!["start a", "stop a", "start b", "stop b"]
        );
    }

    #[test]
    fn run_is_pending_immediately_then_resolves() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);
        assert_eq!(tracker.status(), Status::Idle);

        tracker.run(future::ready(Ok(42)));
        assert_eq!(tracker.status(), Status::Pending);
        assert_eq!(tracker.state(), AsyncState::Pending);

        pool.run_until_stalled();
        let state = tracker.state();
        assert_eq!(state, AsyncState::Resolved(42));
        assert_eq!(state.data(), Some(&42));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn rejection_is_stored_not_raised() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);

        tracker.run(future::ready(Err("boom".to_string())));
        pool.run_until_stalled();

        let state = tracker.state();
        assert_eq!(state.status(), Status::Rejected);
        assert_eq!(state.data(), None);
        assert_eq!(state.error().map(String::as_str), Some("boom"));
        assert_eq!(state.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn teardown_before_settlement_freezes_pending() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);
        let (tx, op) = deferred::<i32>();

        tracker.run(op);
        let snapshot = tracker.state();
        tracker.teardown();
        assert!(!tracker.is_active());

        tx.send(Ok(1)).unwrap();
        pool.run_until_stalled();

        assert_eq!(tracker.state(), snapshot);
        assert_eq!(snapshot, AsyncState::Pending);
    }

    #[test]
    fn operation_still_runs_after_teardown() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<(), String>::new(spawner);
        let side_effect = Rc::new(RefCell::new(false));

        tracker.teardown();
        tracker.teardown();
        let flag = side_effect.clone();
        tracker.run(async move {
            *flag.borrow_mut() = true;
            Ok(())
        });
        pool.run_until_stalled();

        assert!(*side_effect.borrow());
        assert_eq!(tracker.status(), Status::Idle);
    }

    #[test]
    fn dispatch_safely_is_noop_after_teardown() {
        let (_pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);
        let notified = Rc::new(RefCell::new(0));
        let n = notified.clone();
        tracker.subscribe(move |_| *n.borrow_mut() += 1);

        tracker.dispatch_safely(AsyncAction::Resolved(3));
        assert_eq!(tracker.state(), AsyncState::Resolved(3));

        tracker.teardown();
        tracker.dispatch_safely(AsyncAction::Rejected("late".into()));
        assert_eq!(tracker.state(), AsyncState::Resolved(3));
        assert_eq!(*notified.borrow(), 1);
    }

    #[test]
    fn rerunning_a_resolved_operation_is_idempotent() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<&'static str, String>::new(spawner);

        tracker.run(future::ready(Ok("pikachu")));
        pool.run_until_stalled();
        let once = tracker.state();

        tracker.run(future::ready(Ok("pikachu")));
        pool.run_until_stalled();

        assert_eq!(tracker.state(), once);
    }

    #[test]
    fn new_run_clears_previous_result() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);

        tracker.run(future::ready(Err("first".into())));
        pool.run_until_stalled();
        assert_eq!(tracker.status(), Status::Rejected);

        let (tx, op) = deferred();
        tracker.run(op);
        assert_eq!(tracker.state(), AsyncState::Pending);

        tx.send(Ok(9)).unwrap();
        pool.run_until_stalled();
        assert_eq!(tracker.state(), AsyncState::Resolved(9));
    }

    #[test]
    fn subscribers_see_pending_before_settlement() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        tracker.subscribe(move |state| s.borrow_mut().push(state.status()));

        tracker.run(future::ready(Ok(1)));
        tracker.run(future::ready(Err("x".into())));
        pool.run_until_stalled();

        let seen = seen.borrow();
        assert_eq!(&seen[..2], &[Status::Pending, Status::Pending]);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn subscriber_can_retry_after_rejection() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let retry = tracker.clone();
        let s = seen.clone();
        tracker.subscribe(move |state| {
            s.borrow_mut().push(state.status());
            if state.status() == Status::Rejected {
                retry.run(future::ready(Ok(7)));
            }
        });

        tracker.run(future::ready(Err("boom".to_string())));
        pool.run_until_stalled();

        assert_eq!(tracker.state(), AsyncState::Resolved(7));
        assert_eq!(
            *seen.borrow(),
            vec![
                Status::Pending,
                Status::Rejected,
                Status::Pending,
                Status::Resolved
            ]
        );
    }

    #[test]
    fn subscriber_dispatch_is_dropped_once_torn_down() {
        let (_pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);

        let handle = tracker.clone();
        tracker.subscribe(move |state| {
            if let AsyncState::Resolved(n) = state {
                handle.teardown();
                handle.dispatch_safely(AsyncAction::Resolved(n + 1));
            }
        });

        tracker.dispatch_safely(AsyncAction::Resolved(1));
        assert_eq!(tracker.state(), AsyncState::Resolved(1));
        assert!(!tracker.is_active());
    }

    #[test]
    fn race_policy_lets_last_settler_win() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<&'static str, String>::new(spawner);
        assert_eq!(tracker.overlap_policy(), OverlapPolicy::Race);

        let (first_tx, first) = deferred();
        let (second_tx, second) = deferred();
        tracker.run(first);
        tracker.run(second);

        second_tx.send(Ok("second")).unwrap();
        pool.run_until_stalled();
        assert_eq!(tracker.state(), AsyncState::Resolved("second"));

        first_tx.send(Ok("first")).unwrap();
        pool.run_until_stalled();
        assert_eq!(tracker.state(), AsyncState::Resolved("first"));
    }

    #[test]
    fn latest_only_policy_drops_superseded_results() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<&'static str, String>::with_config(
            spawner,
            TrackerConfig::new().overlap(OverlapPolicy::LatestOnly),
        );

        let (first_tx, first) = deferred();
        let (second_tx, second) = deferred();
        tracker.run(first);
        tracker.run(second);

        second_tx.send(Ok("second")).unwrap();
        pool.run_until_stalled();
        first_tx.send(Err("stale".into())).unwrap();
        pool.run_until_stalled();

        assert_eq!(tracker.state(), AsyncState::Resolved("second"));
    }

    #[test]
    fn initial_state_from_config() {
        let (_pool, spawner) = pool_and_spawner();

        let pending = AsyncTracker::<i32, String>::with_config(
            spawner.clone(),
            TrackerConfig::new().pending_if(true),
        );
        assert_eq!(pending.status(), Status::Pending);

        let idle = AsyncTracker::<i32, String>::with_config(
            spawner.clone(),
            TrackerConfig::new().pending_if(false),
        );
        assert_eq!(idle.status(), Status::Idle);

        let initial = AsyncState::from_parts(Status::Resolved, Some(5), None).unwrap();
        let resolved =
            AsyncTracker::<i32, String>::with_config(spawner, TrackerConfig::new().initial(initial));
        assert_eq!(resolved.state(), AsyncState::Resolved(5));
    }

    #[test]
    fn from_parts_enforces_payload_invariant() {
        assert_eq!(
            AsyncState::<i32, String>::from_parts(Status::Resolved, None, None),
            Err(Error::MissingPayload {
                status: "resolved",
                field: "data"
            })
        );
        assert_eq!(
            AsyncState::<i32, String>::from_parts(Status::Idle, Some(1), None),
            Err(Error::UnexpectedPayload {
                status: "idle",
                field: "data"
            })
        );
        assert_eq!(
            AsyncState::<i32, String>::from_parts(Status::Resolved, Some(1), Some("e".into())),
            Err(Error::UnexpectedPayload {
                status: "resolved",
                field: "error"
            })
        );
        assert_eq!(
            AsyncState::<i32, String>::from_parts(Status::Rejected, None, Some("e".into())),
            Ok(AsyncState::Rejected("e".to_string()))
        );
    }

    #[test]
    fn unknown_action_tag_fails_fast() {
        let state = AsyncState::<i32, String>::Idle;
        let result = reduce_tagged(&state, "bogus", Some(1), None);
        assert_eq!(result, Err(Error::UnhandledAction("bogus".to_string())));
        assert_eq!(
            result.unwrap_err().to_string(),
            "unhandled action type: bogus"
        );
    }

    #[test]
    fn tagged_actions_follow_the_transition_function() {
        let state = AsyncState::<i32, String>::Resolved(1);

        assert_eq!(
            reduce_tagged(&state, "pending", None, None),
            Ok(AsyncState::Pending)
        );
        assert_eq!(
            reduce_tagged(&state, "rejected", None, Some("e".to_string())),
            Ok(AsyncState::Rejected("e".to_string()))
        );
        assert!(matches!(
            reduce_tagged(&state, "resolved", None, None),
            Err(Error::MissingPayload { .. })
        ));
        assert_eq!("rejected".parse::<ActionKind>(), Ok(ActionKind::Rejected));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            Status::Idle,
            Status::Pending,
            Status::Resolved,
            Status::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<Status>(), Ok(status));
        }
        assert!(matches!(
            "done".parse::<Status>(),
            Err(Error::UnknownStatus(_))
        ));
    }

    #[test]
    fn async_reducer_drives_a_store() {
        let store = Store::<AsyncReducer<i32, String>>::new(AsyncState::Idle);
        store.dispatch(AsyncAction::Pending);
        assert!(store.state().is_pending());
        store.dispatch(AsyncAction::Resolved(8));
        assert_eq!(store.state().into_result(), Ok(Some(8)));
    }

    #[test]
    fn store_dispatch_from_subscriber_reduces_latest_state() {
        let store = Store::<AsyncReducer<i32, String>>::new(AsyncState::Idle);
        let handle = store.clone();
        store.subscribe(move |state| {
            if state.is_pending() {
                handle.dispatch(AsyncAction::Resolved(1));
            }
        });

        store.dispatch(AsyncAction::Pending);
        assert_eq!(store.state(), AsyncState::Resolved(1));
    }

    #[test]
    fn scope_disposal_tears_down_tracker() {
        let (mut pool, spawner) = pool_and_spawner();
        let scope = Scope::new();
        let tracker = scope.run(|| AsyncTracker::<i32, String>::new(spawner));
        let (tx, op) = deferred();

        tracker.run(op);
        scope.dispose();
        assert!(!tracker.is_active());

        tx.send(Ok(1)).unwrap();
        pool.run_until_stalled();
        assert_eq!(tracker.status(), Status::Pending);
    }

    #[test]
    fn use_async_keeps_one_tracker_per_composition() {
        let (mut pool, spawner) = pool_and_spawner();
        let composition = Composition::new();

        let first = composition.compose(|| {
            use_async::<i32, String>(spawner.clone(), || TrackerConfig::new().pending_if(true))
        });
        assert_eq!(first.status(), Status::Pending);
        first.run(future::ready(Ok(3)));
        pool.run_until_stalled();

        let second = composition
            .compose(|| use_async::<i32, String>(spawner.clone(), TrackerConfig::new));
        assert_eq!(second.state(), AsyncState::Resolved(3));

        composition.dispose();
        assert!(!first.is_active());
    }

    #[test]
    fn use_reducer_keeps_state_across_compositions() {
        let composition = Composition::new();
        let body = || {
            let store = use_reducer::<AsyncReducer<u8, String>>(AsyncState::default);
            if store.state().is_idle() {
                store.dispatch(AsyncAction::Pending);
            } else {
                store.dispatch(AsyncAction::Resolved(1));
            }
            store.state().status()
        };

        assert_eq!(composition.compose(body), Status::Pending);
        assert_eq!(composition.compose(body), Status::Resolved);
    }

    #[test]
    fn dropped_tracker_ignores_settlement() {
        let (mut pool, spawner) = pool_and_spawner();
        let tracker = AsyncTracker::<i32, String>::new(spawner);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        tracker.subscribe(move |state| s.borrow_mut().push(state.status()));

        tracker.run(future::ready(Ok(1)));
        drop(tracker);
        pool.run_until_stalled();

        assert_eq!(*seen.borrow(), vec![Status::Pending]);
    }
}
