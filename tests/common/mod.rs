#![allow(dead_code)]

use std::sync::Arc;

use lark::engine::{Engine, EngineOptions};
use lark::errors::LarkError;
use lark_test_utils::fake_backend::FakeBackend;

pub use lark_test_utils::{init_tracing, with_timeout};

/// Engine whose processes are simulated by `backend`.
pub fn fake_engine(backend: &FakeBackend) -> Engine {
    fake_engine_with(backend, EngineOptions::default())
}

pub fn fake_engine_with(backend: &FakeBackend, options: EngineOptions) -> Engine {
    Engine::with_backend(options, Arc::new(backend.clone()))
}

/// A distinguishable failure for closures scheduled in tests.
pub fn failure(msg: &str) -> LarkError {
    LarkError::Argument(msg.to_string())
}

/// Assert that `err` (possibly wrapped as asynchronous) is `failure(msg)`.
pub fn assert_failure(err: &LarkError, msg: &str) {
    match err.root() {
        LarkError::Argument(m) => assert_eq!(m, msg, "unexpected failure: {err}"),
        other => panic!("expected failure {msg:?}, got: {other:?}"),
    }
}
