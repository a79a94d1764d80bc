// src/engine/mod.rs

//! Orchestration engine for lark.
//!
//! An [`Engine`] owns one task registry, one group registry and one process
//! executor. Engines share nothing, so several may coexist (tests rely on
//! this).
//!
//! Control flow for one invocation: [`Engine::run`] resolves a name and
//! awaits the task body inline (bodies may call `run` again, which is a
//! plain nested call), then [`Engine::drain`] waits on every group until
//! no group reports pending work.

pub mod runner;

pub use runner::Engine;

use crate::types::ErrorMode;

/// Engine-wide settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Maximum number of `start`ed processes running at once.
    /// `None` or `Some(0)` means unbounded. Synchronous `exec` is not
    /// limited.
    pub parallelism: Option<usize>,

    /// Log discarded group errors and ignored command failures at `warn`.
    pub verbose: bool,

    /// How groups record errors. `wait` reports the first error either way.
    pub error_mode: ErrorMode,

    /// Fail with `CycleDetected` when a task is re-entered on its own call
    /// chain. Off by default: unbounded recursion is the caller's problem.
    pub detect_cycles: bool,
}
