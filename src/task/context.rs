// src/task/context.rs

//! The value handed to a running task body.
//!
//! Besides the resolved name and pattern captures, a `Context` carries the
//! engine handle, so the scripting-facing operations (`run`, `exec`,
//! `start`, `make_group`, `wait`, `log`, `environ`) are methods on it.

use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use tracing::info;

use crate::engine::Engine;
use crate::errors::Result;
use crate::exec::ProcessSpec;
use crate::types::OneOrMany;

#[derive(Debug, Clone)]
pub struct Context {
    engine: Engine,
    name: String,
    captures: Vec<String>,
    /// Names of the tasks currently being run by this chain of calls,
    /// outermost first, ending with `name`.
    stack: Arc<Vec<String>>,
}

impl Context {
    pub(crate) fn new(
        engine: Engine,
        name: String,
        captures: Vec<String>,
        stack: Arc<Vec<String>>,
    ) -> Self {
        Self {
            engine,
            name,
            captures,
            stack,
        }
    }

    /// Name the task was invoked under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capture groups of the pattern match, excluding the whole match.
    /// Empty for exact-name tasks.
    pub fn captures(&self) -> &[String] {
        self.captures.get(1..).unwrap_or(&[])
    }

    /// Match group `i` (0 is the whole match).
    pub fn capture(&self, i: usize) -> Option<&str> {
        self.captures.get(i).map(String::as_str)
    }

    /// Whole match followed by the capture groups.
    pub fn all_captures(&self) -> &[String] {
        &self.captures
    }

    /// Tasks on the current call chain, outermost first.
    pub fn call_stack(&self) -> &[String] {
        &self.stack
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run another task inline and return the error its body produced.
    /// An empty `name` runs the default task.
    pub async fn run(&self, name: &str) -> Result<()> {
        self.engine.invoke(name, Arc::clone(&self.stack)).await
    }

    /// Run a command synchronously; its failure (unless ignored) is
    /// returned directly.
    pub async fn exec(&self, spec: ProcessSpec) -> Result<()> {
        self.engine.executor().run(&spec).await
    }

    /// Schedule a command into `group`. The returned error reflects only
    /// scheduling failure; the command's own outcome is observed through a
    /// later `wait` on the group.
    pub fn start(&self, spec: ProcessSpec, group: &str) -> Result<()> {
        let executor = self.engine.executor().clone();
        self.engine
            .groups()
            .get_or_create(group)
            .exec(async move { executor.run_limited(&spec).await })
    }

    /// Explicitly create a group following `follows`.
    pub fn make_group(&self, name: &str, follows: impl Into<OneOrMany>) -> Result<()> {
        let follows = follows.into().into_vec();
        self.engine.groups().make_group(name, &follows).map(|_| ())
    }

    /// Wait on the named groups (all groups when `names` is empty) and
    /// return the first recorded error.
    pub async fn wait(&self, names: &[String]) -> Result<()> {
        self.engine.groups().wait_all(names).await
    }

    /// Snapshot of this process's environment. Non-UTF-8 names and values
    /// are converted lossily.
    pub fn environ(&self) -> BTreeMap<String, String> {
        env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    pub fn log(&self, msg: &str) {
        info!(target: "lark::task", task = %self.name, "{msg}");
    }
}
