// tests/group_ordering.rs

mod common;
use crate::common::{assert_failure, failure, init_tracing, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lark::engine::Engine;
use lark::errors::LarkError;
use lark::group::{batched, GroupOptions, GroupRegistry};
use lark::types::ErrorMode;

fn registry() -> GroupRegistry {
    GroupRegistry::new(GroupOptions::default())
}

#[tokio::test]
async fn follower_starts_only_after_followed_group_drains() {
    init_tracing();

    let groups = registry();
    let a = groups.make_group("A", &[]).unwrap();
    let b = groups.make_group("B", &["A".to_string()]).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    // Submitted first, but must not run before A's work is done.
    let seen = Arc::clone(&counter);
    b.exec(async move {
        match seen.load(Ordering::SeqCst) {
            1 => Ok(()),
            other => Err(failure(&format!("B ran with counter {other}"))),
        }
    })
    .unwrap();

    let set = Arc::clone(&counter);
    a.exec(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        set.store(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    with_timeout(b.wait()).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(a.outstanding(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn follow_order_holds_on_a_multi_threaded_runtime() {
    for round in 0..2000 {
        let groups = registry();
        let a = groups.make_group("A", &[]).unwrap();
        let b = groups.make_group("B", &["A".to_string()]).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let set = Arc::clone(&counter);

        let result = batched(async {
            b.exec(async move {
                match seen.load(Ordering::SeqCst) {
                    1 => Ok(()),
                    other => Err(failure(&format!("B ran with counter {other}"))),
                }
            })?;
            a.exec(async move {
                set.store(1, Ordering::SeqCst);
                Ok(())
            })?;
            b.wait().await
        });

        if let Err(err) = with_timeout(result).await {
            panic!("round {round}: {err}");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn task_bodies_keep_follow_order_on_a_multi_threaded_runtime() {
    for round in 0..500 {
        let engine = Engine::default();
        engine
            .register("reversed", |ctx| async move {
                ctx.make_group("B", "A")?;
                let groups = ctx.engine().groups();
                let counter = Arc::new(AtomicUsize::new(0));
                let seen = Arc::clone(&counter);

                groups.get_or_create("B").exec(async move {
                    match seen.load(Ordering::SeqCst) {
                        1 => Ok(()),
                        other => Err(failure(&format!("B ran with counter {other}"))),
                    }
                })?;
                groups.get_or_create("A").exec(async move {
                    counter.store(1, Ordering::SeqCst);
                    Ok(())
                })?;
                Ok::<(), LarkError>(())
            })
            .unwrap();

        if let Err(err) = with_timeout(engine.run_and_drain("reversed")).await {
            panic!("round {round}: {err}");
        }
    }
}

#[tokio::test]
async fn outstanding_counts_work_before_it_runs() {
    let groups = registry();
    let g = groups.get_or_create("g");

    g.exec(async { Ok(()) }).unwrap();
    g.exec(async { Ok(()) }).unwrap();
    assert_eq!(g.outstanding(), 2);

    with_timeout(g.wait()).await.unwrap();
    assert_eq!(g.outstanding(), 0);
}

#[tokio::test]
async fn first_error_wins() {
    let groups = registry();
    let g = groups.get_or_create("compile");

    g.exec(async { Err(failure("E1")) }).unwrap();
    g.exec(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err(failure("E2"))
    })
    .unwrap();

    let err = with_timeout(g.wait()).await.unwrap_err();
    assert_failure(&err, "E1");
    assert!(matches!(&err, LarkError::Async { group, .. } if group == "compile"));
    assert_eq!(g.errors().len(), 1);
}

#[tokio::test]
async fn accumulate_mode_keeps_every_error() {
    let groups = GroupRegistry::new(GroupOptions {
        error_mode: ErrorMode::Accumulate,
        verbose: false,
    });
    let g = groups.get_or_create("compile");

    g.exec(async { Err(failure("E1")) }).unwrap();
    g.exec(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err(failure("E2"))
    })
    .unwrap();

    let err = with_timeout(g.wait()).await.unwrap_err();
    assert_failure(&err, "E1");

    let errors = g.errors();
    assert_eq!(errors.len(), 2);
    assert_failure(&errors[1], "E2");
}

#[tokio::test]
async fn wait_is_idempotent_and_the_error_sticks() {
    let groups = registry();
    let g = groups.get_or_create("g");

    g.exec(async { Err(failure("boom")) }).unwrap();

    let first = with_timeout(g.wait()).await.unwrap_err();
    let second = with_timeout(g.wait()).await.unwrap_err();
    assert_failure(&first, "boom");
    assert_failure(&second, "boom");

    // Later successful work does not clear the slot.
    g.exec(async { Ok(()) }).unwrap();
    let third = with_timeout(g.wait()).await.unwrap_err();
    assert_failure(&third, "boom");
}

#[tokio::test]
async fn followed_group_errors_stay_in_their_own_group() {
    let groups = registry();
    let a = groups.make_group("A", &[]).unwrap();
    let b = groups.make_group("B", &["A".to_string()]).unwrap();

    a.exec(async { Err(failure("in A")) }).unwrap();
    b.exec(async { Ok(()) }).unwrap();

    with_timeout(b.wait()).await.unwrap();
    let err = with_timeout(groups.wait_all(&[])).await.unwrap_err();
    assert_failure(&err, "in A");
}

#[tokio::test]
async fn wait_with_no_groups_is_ok() {
    let groups = registry();
    with_timeout(groups.wait_all(&[])).await.unwrap();
    assert!(groups.is_empty());

    let engine = Engine::default();
    with_timeout(engine.drain()).await.unwrap();
}

#[tokio::test]
async fn wait_all_on_unknown_names_creates_them() {
    let groups = registry();
    with_timeout(groups.wait_all(&["later".to_string()])).await.unwrap();
    assert!(groups.get("later").is_some());
}

#[test]
fn explicit_creation_conflicts_with_existing_group() {
    let groups = registry();
    groups.make_group("x", &[]).unwrap();

    match groups.make_group("x", &[]) {
        Err(LarkError::GroupConflict(name)) => assert_eq!(name, "x"),
        other => panic!("expected GroupConflict, got {other:?}"),
    }

    // Implicitly created groups conflict too.
    groups.get_or_create("y");
    assert!(matches!(
        groups.make_group("y", &[]),
        Err(LarkError::GroupConflict(_))
    ));

    // Implicit creation never conflicts.
    let x = groups.get_or_create("x");
    assert_eq!(x.name(), "x");
}

#[test]
fn make_group_creates_followed_groups_implicitly() {
    let groups = registry();
    let link = groups
        .make_group(
            "link",
            &["objects".to_string(), "headers".to_string(), "objects".to_string()],
        )
        .unwrap();

    assert_eq!(link.follows(), vec!["objects", "headers"]);
    assert!(groups.get("objects").is_some());
    assert!(groups.get("headers").is_some());

    let names: Vec<String> = groups
        .snapshot()
        .iter()
        .map(|g| g.name().to_string())
        .collect();
    assert_eq!(names, vec!["objects", "headers", "link"]);

    // The implicitly created followers can no longer be made explicitly.
    assert!(matches!(
        groups.make_group("objects", &[]),
        Err(LarkError::GroupConflict(_))
    ));
}

#[test]
fn group_cannot_follow_itself() {
    let groups = registry();
    let err = groups.make_group("loop", &["loop".to_string()]).unwrap_err();
    assert!(matches!(err, LarkError::Argument(_)));
    assert!(groups.get("loop").is_none());
}

#[tokio::test]
async fn drain_picks_up_groups_created_while_waiting() {
    init_tracing();

    let engine = Engine::default();
    let inner = engine.clone();

    engine
        .groups()
        .get_or_create("early")
        .exec(async move {
            inner.groups().get_or_create("late").exec(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(failure("late failure"))
            })
        })
        .unwrap();

    let err = with_timeout(engine.drain()).await.unwrap_err();
    assert_failure(&err, "late failure");
    assert_eq!(engine.groups().len(), 2);
    assert!(!engine.groups().has_pending());
}

#[tokio::test]
async fn panicking_work_is_recorded_as_an_error() {
    let groups = registry();
    let g = groups.get_or_create("g");

    let explode = true;
    g.exec(async move {
        if explode {
            panic!("work blew up");
        }
        Ok(())
    })
    .unwrap();

    let err = with_timeout(g.wait()).await.unwrap_err();
    assert!(matches!(err.root(), LarkError::Other(_)));
    assert_eq!(g.outstanding(), 0);
}

#[test]
fn exec_outside_a_runtime_fails_to_schedule() {
    let groups = registry();
    let g = groups.get_or_create("g");

    assert!(g.exec(async { Ok(()) }).is_err());
    assert_eq!(g.outstanding(), 0);
}
