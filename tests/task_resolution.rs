// tests/task_resolution.rs

mod common;
use crate::common::{failure, init_tracing};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lark::engine::{Engine, EngineOptions};
use lark::errors::LarkError;
use lark::task::{task_body, TaskKey, TaskRegistry};

fn noop_registry(names: &[&str], patterns: &[&str]) -> TaskRegistry {
    let mut reg = TaskRegistry::new();
    for name in names {
        reg.register(name, task_body(|_| async { Ok(()) })).unwrap();
    }
    for expr in patterns {
        reg.register_pattern(expr, task_body(|_| async { Ok(()) }))
            .unwrap();
    }
    reg
}

#[test]
fn exact_name_resolves_with_empty_captures() {
    let reg = noop_registry(&["build", "test"], &[r"\.o$"]);

    let resolved = reg.resolve("test").unwrap();
    assert_eq!(resolved.name, "test");
    assert!(resolved.captures.is_empty());
}

#[test]
fn exact_name_wins_over_matching_pattern() {
    let reg = noop_registry(&["main.o"], &[r"\.o$"]);

    let resolved = reg.resolve("main.o").unwrap();
    assert!(resolved.captures.is_empty());
}

#[test]
fn first_registered_pattern_wins() {
    // Without capture groups only the whole match is recorded, which is
    // enough to tell the patterns apart.
    let reg = noop_registry(&[], &[r"\.o$", r"\.c$", r"\..$"]);

    let resolved = reg.resolve("main.o").unwrap();
    assert_eq!(resolved.captures, vec![".o".to_string()]);

    let resolved = reg.resolve("main.c").unwrap();
    assert_eq!(resolved.captures, vec![".c".to_string()]);

    let resolved = reg.resolve("main.h").unwrap();
    assert_eq!(resolved.captures, vec![".h".to_string()]);
}

#[test]
fn pattern_captures_include_whole_match_then_groups() {
    let reg = noop_registry(&[], &[r"^(.+)\.(o|a)$"]);

    let resolved = reg.resolve("lib/util.a").unwrap();
    assert_eq!(
        resolved.captures,
        vec!["lib/util.a".to_string(), "lib/util".to_string(), "a".to_string()]
    );
}

#[test]
fn pattern_matches_partially() {
    let reg = noop_registry(&[], &["gen"]);
    assert!(reg.resolve("codegen-all").is_ok());
}

#[test]
fn missing_task_is_no_such_task() {
    let reg = noop_registry(&["build"], &[r"\.o$"]);

    match reg.resolve("missing") {
        Err(LarkError::NoSuchTask(name)) => assert_eq!(name, "missing"),
        other => panic!("expected NoSuchTask, got {other:?}"),
    }
}

#[test]
fn empty_name_without_tasks_is_no_default_task() {
    let reg = TaskRegistry::new();
    assert!(matches!(reg.resolve(""), Err(LarkError::NoDefaultTask)));
}

#[test]
fn first_registered_task_is_default_even_if_pattern() {
    let reg = noop_registry(&[], &[r"\.o$"]);
    assert_eq!(reg.default_task(), Some(&TaskKey::Pattern(r"\.o$".to_string())));

    let resolved = reg.resolve("").unwrap();
    assert_eq!(resolved.name, r"\.o$");
    assert!(resolved.captures.is_empty());

    let reg = noop_registry(&["all", "clean"], &[]);
    assert_eq!(reg.resolve("").unwrap().name, "all");
}

#[test]
fn registration_rejects_bad_input() {
    let mut reg = TaskRegistry::new();

    let err = reg.register("", task_body(|_| async { Ok(()) })).unwrap_err();
    assert!(matches!(err, LarkError::Argument(_)));

    let err = reg
        .register_pattern("(unclosed", task_body(|_| async { Ok(()) }))
        .unwrap_err();
    assert!(matches!(err, LarkError::Argument(_)));

    reg.register("build", task_body(|_| async { Ok(()) })).unwrap();
    let err = reg.register("build", task_body(|_| async { Ok(()) })).unwrap_err();
    assert!(matches!(err, LarkError::Argument(_)));

    // Failed registrations do not claim the default slot.
    assert_eq!(reg.keys(), &[TaskKey::Exact("build".to_string())]);
}

#[tokio::test]
async fn run_invokes_body_exactly_once() {
    init_tracing();

    let engine = Engine::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&calls);
    engine
        .register("build", move |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();

    engine.run("build").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    engine.run("").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn run_passes_captures_to_body() {
    let engine = Engine::default();
    let seen = Arc::new(Mutex::new(None));

    let s = Arc::clone(&seen);
    engine
        .register_pattern(r"^(\w+)\.o$", move |ctx| {
            let s = Arc::clone(&s);
            async move {
                *s.lock().unwrap() = Some((
                    ctx.name().to_string(),
                    ctx.captures().to_vec(),
                    ctx.capture(0).map(str::to_string),
                ));
                Ok(())
            }
        })
        .unwrap();

    engine.run("main.o").await.unwrap();

    let (name, captures, whole) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(name, "main.o");
    assert_eq!(captures, vec!["main".to_string()]);
    assert_eq!(whole.as_deref(), Some("main.o"));
}

#[tokio::test]
async fn run_returns_body_error_and_nested_runs_are_inline() {
    let engine = Engine::default();
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = Arc::clone(&order);
    engine
        .register("all", move |ctx| {
            let o = Arc::clone(&o);
            async move {
                o.lock().unwrap().push("all:start");
                ctx.run("dep").await?;
                o.lock().unwrap().push("all:end");
                Ok(())
            }
        })
        .unwrap();

    let o = Arc::clone(&order);
    engine
        .register("dep", move |ctx| {
            let o = Arc::clone(&o);
            async move {
                assert_eq!(ctx.call_stack(), &["all".to_string(), "dep".to_string()]);
                o.lock().unwrap().push("dep");
                Ok(())
            }
        })
        .unwrap();

    engine
        .register("broken", |ctx| async move {
            ctx.run("all").await?;
            Err(failure("broken body"))
        })
        .unwrap();

    engine.run("all").await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["all:start", "dep", "all:end"]);

    let err = engine.run("broken").await.unwrap_err();
    assert!(matches!(err, LarkError::Argument(ref m) if m == "broken body"));

    let err = engine.run("nope").await.unwrap_err();
    assert!(matches!(err, LarkError::NoSuchTask(_)));
}

#[tokio::test]
async fn cycle_detection_is_opt_in() {
    let engine = Engine::new(EngineOptions {
        detect_cycles: true,
        ..EngineOptions::default()
    });

    engine
        .register("a", |ctx| async move { ctx.run("b").await })
        .unwrap();
    engine
        .register("b", |ctx| async move { ctx.run("a").await })
        .unwrap();

    match engine.run("a").await {
        Err(LarkError::CycleDetected(chain)) => assert_eq!(chain, "a -> b -> a"),
        other => panic!("expected CycleDetected, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_runs_of_the_same_task_are_not_cycles() {
    let engine = Engine::new(EngineOptions {
        detect_cycles: true,
        ..EngineOptions::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&calls);
    engine
        .register("leaf", move |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .unwrap();
    engine
        .register("twice", |ctx| async move {
            ctx.run("leaf").await?;
            ctx.run("leaf").await
        })
        .unwrap();

    engine.run("twice").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn engines_are_isolated() {
    let a = Engine::default();
    let b = Engine::default();

    a.register("only-in-a", |_| async { Ok(()) }).unwrap();

    assert!(a.run("only-in-a").await.is_ok());
    assert!(matches!(
        b.run("only-in-a").await,
        Err(LarkError::NoSuchTask(_))
    ));
    assert!(matches!(b.run("").await, Err(LarkError::NoDefaultTask)));
}
