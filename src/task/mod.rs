// src/task/mod.rs

//! Tasks: registration, name resolution, and the per-invocation context.

pub mod context;
pub mod registry;

pub use context::Context;
pub use registry::{task_body, BoxFuture, ResolvedTask, TaskBody, TaskKey, TaskRegistry};
