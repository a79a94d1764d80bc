// src/task/registry.rs

//! Exact-name and pattern task storage, and name resolution.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::errors::{LarkError, Result};
use crate::task::context::Context;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The executable logic of a task.
pub type TaskBody = Arc<dyn Fn(Context) -> BoxFuture<Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`TaskBody`].
pub fn task_body<F, Fut>(body: F) -> TaskBody
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(body(ctx)) as BoxFuture<Result<()>>)
}

/// How a task is keyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKey {
    Exact(String),
    Pattern(String),
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKey::Exact(name) => f.write_str(name),
            TaskKey::Pattern(expr) => write!(f, "/{expr}/"),
        }
    }
}

struct PatternTask {
    regex: Regex,
    body: TaskBody,
}

/// Outcome of [`TaskRegistry::resolve`].
#[derive(Clone)]
pub struct ResolvedTask {
    /// The name the task was invoked under (the default's name if the
    /// request was empty).
    pub name: String,
    pub body: TaskBody,
    /// Match groups for pattern tasks: index 0 is the whole match, then one
    /// entry per capture group (empty when a group did not participate).
    /// Empty for exact tasks.
    pub captures: Vec<String>,
}

impl fmt::Debug for ResolvedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTask")
            .field("name", &self.name)
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}

/// Append-only task table.
///
/// The first task registered, of either kind, is the default.
#[derive(Default)]
pub struct TaskRegistry {
    exact: HashMap<String, TaskBody>,
    patterns: Vec<PatternTask>,
    /// Every task key in registration order.
    order: Vec<TaskKey>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.order)
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exact-name task.
    pub fn register(&mut self, name: &str, body: TaskBody) -> Result<()> {
        if name.is_empty() {
            return Err(LarkError::Argument("task name is empty".to_string()));
        }
        if self.exact.contains_key(name) {
            return Err(LarkError::Argument(format!(
                "task already registered: {name:?}"
            )));
        }

        debug!(task = %name, "registered task");
        self.exact.insert(name.to_string(), body);
        self.order.push(TaskKey::Exact(name.to_string()));
        Ok(())
    }

    /// Register a pattern task. Patterns are tried in registration order.
    pub fn register_pattern(&mut self, expr: &str, body: TaskBody) -> Result<()> {
        let regex = Regex::new(expr).map_err(|e| {
            LarkError::Argument(format!("invalid task pattern {expr:?}: {e}"))
        })?;

        debug!(pattern = %expr, "registered pattern task");
        self.patterns.push(PatternTask { regex, body });
        self.order.push(TaskKey::Pattern(expr.to_string()));
        Ok(())
    }

    /// The default task, if any task has been registered.
    pub fn default_task(&self) -> Option<&TaskKey> {
        self.order.first()
    }

    /// Every task key, in registration order.
    pub fn keys(&self) -> &[TaskKey] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolve `name` to a task body.
    ///
    /// An empty `name` selects the default task. Exact names win over
    /// patterns; patterns are scanned in registration order and the first
    /// one matching anywhere in `name` is used.
    pub fn resolve(&self, name: &str) -> Result<ResolvedTask> {
        if name.is_empty() {
            return self.resolve_default();
        }

        if let Some(body) = self.exact.get(name) {
            return Ok(ResolvedTask {
                name: name.to_string(),
                body: Arc::clone(body),
                captures: Vec::new(),
            });
        }

        for task in &self.patterns {
            if let Some(caps) = task.regex.captures(name) {
                let captures = caps
                    .iter()
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                debug!(task = %name, pattern = %task.regex, "resolved via pattern");
                return Ok(ResolvedTask {
                    name: name.to_string(),
                    body: Arc::clone(&task.body),
                    captures,
                });
            }
        }

        Err(LarkError::NoSuchTask(name.to_string()))
    }

    /// A pattern default runs its body directly under the pattern's source
    /// text, with no captures.
    fn resolve_default(&self) -> Result<ResolvedTask> {
        match self.default_task() {
            None => Err(LarkError::NoDefaultTask),
            Some(TaskKey::Exact(name)) => self.resolve(name),
            Some(TaskKey::Pattern(expr)) => {
                let task = self
                    .patterns
                    .iter()
                    .find(|t| t.regex.as_str() == expr)
                    .ok_or(LarkError::NoDefaultTask)?;
                Ok(ResolvedTask {
                    name: expr.clone(),
                    body: Arc::clone(&task.body),
                    captures: Vec::new(),
                })
            }
        }
    }
}
