// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`spec`] holds the validated per-invocation configuration
//!   ([`ProcessSpec`]) and the loose option shape it is built from.
//! - [`redirect`] turns stdin/stdout/stderr directives into `Stdio` handles.
//! - [`backend`] provides the `ProcessBackend` trait and the
//!   `tokio::process` implementation used in production.
//! - [`executor`] wraps a backend with `ignore` semantics and the optional
//!   parallelism limit used by asynchronous `start` work.

pub mod backend;
pub mod executor;
pub mod redirect;
pub mod spec;

pub use backend::{ProcessBackend, SystemBackend};
pub use executor::ProcessExecutor;
pub use spec::{ExecOptions, OutputSink, ProcessSpec, StdinSource, OWN_STDERR, OWN_STDOUT};
