// src/engine/runner.rs

//! The engine: owns the task and group registries and orchestrates one
//! top-level invocation (run the task, then drain every group).

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::engine::EngineOptions;
use crate::errors::{LarkError, Result};
use crate::exec::{ProcessBackend, ProcessExecutor, SystemBackend};
use crate::group::{batched, GroupOptions, GroupRegistry};
use crate::task::{task_body, BoxFuture, Context, TaskKey, TaskRegistry};

/// Cheap-to-clone handle to one isolated engine instance.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    tasks: RwLock<TaskRegistry>,
    groups: GroupRegistry,
    executor: ProcessExecutor,
    options: EngineOptions,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.inner.options)
            .field("groups", &self.inner.groups.len())
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_backend(options, Arc::new(SystemBackend))
    }

    /// Engine whose processes are run by `backend` (tests use a fake).
    pub fn with_backend(options: EngineOptions, backend: Arc<dyn ProcessBackend>) -> Self {
        let executor = ProcessExecutor::new(backend, options.parallelism, options.verbose);
        let groups = GroupRegistry::new(GroupOptions {
            error_mode: options.error_mode,
            verbose: options.verbose,
        });

        Self {
            inner: Arc::new(EngineInner {
                tasks: RwLock::new(TaskRegistry::new()),
                groups,
                executor,
                options,
            }),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.inner.groups
    }

    pub fn executor(&self) -> &ProcessExecutor {
        &self.inner.executor
    }

    /// Register an exact-name task.
    pub fn register<F, Fut>(&self, name: &str, body: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks_mut().register(name, task_body(body))
    }

    /// Register a pattern task.
    pub fn register_pattern<F, Fut>(&self, expr: &str, body: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks_mut().register_pattern(expr, task_body(body))
    }

    /// Registered task keys in registration order (the first is the default).
    pub fn task_keys(&self) -> Vec<TaskKey> {
        self.tasks().keys().to_vec()
    }

    /// Resolve and invoke one task body on the calling task, returning the
    /// error the body produced. Errors from group work are not reported
    /// here; see [`drain`](Self::drain).
    pub async fn run(&self, name: &str) -> Result<()> {
        self.invoke(name, Arc::new(Vec::new())).await
    }

    /// Wait on every group until none has pending work, including groups
    /// created while waiting. Returns the first error observed.
    pub async fn drain(&self) -> Result<()> {
        let mut first_err = None;
        let mut pass = 0usize;

        loop {
            pass += 1;
            let known = self.groups().len();

            if let Err(err) = self.groups().wait_all(&[]).await {
                first_err.get_or_insert(err);
            }

            if self.groups().len() == known && !self.groups().has_pending() {
                break;
            }
            debug!(pass, "groups changed while draining; waiting again");
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// `run` followed by `drain`; the first error of either phase wins.
    pub async fn run_and_drain(&self, name: &str) -> Result<()> {
        let run_result = self.run(name).await;
        let drain_result = self.drain().await;
        run_result.and(drain_result)
    }

    /// Run and drain each named task in order, stopping at the first
    /// failure. No names means the default task.
    pub async fn run_all(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return self.run_and_drain("").await;
        }
        for name in names {
            if name.is_empty() {
                return Err(LarkError::Argument("invalid task name".to_string()));
            }
        }
        for name in names {
            self.run_and_drain(name).await?;
        }
        Ok(())
    }

    /// Resolve and invoke `name` beneath the given call chain.
    pub(crate) fn invoke(&self, name: &str, stack: Arc<Vec<String>>) -> BoxFuture<Result<()>> {
        let engine = self.clone();
        let requested = name.to_string();

        Box::pin(batched(async move {
            let resolved = engine.tasks().resolve(&requested)?;

            if engine.inner.options.detect_cycles && stack.contains(&resolved.name) {
                let mut chain: Vec<&str> = stack.iter().map(String::as_str).collect();
                chain.push(&resolved.name);
                return Err(LarkError::CycleDetected(chain.join(" -> ")));
            }

            let mut chain = Vec::with_capacity(stack.len() + 1);
            chain.extend(stack.iter().cloned());
            chain.push(resolved.name.clone());

            info!(task = %resolved.name, depth = stack.len(), "running task");

            let ctx = Context::new(
                engine.clone(),
                resolved.name,
                resolved.captures,
                Arc::new(chain),
            );
            (resolved.body)(ctx).await
        }))
    }

    fn tasks(&self) -> RwLockReadGuard<'_, TaskRegistry> {
        self.inner.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks_mut(&self) -> RwLockWriteGuard<'_, TaskRegistry> {
        self.inner.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }
}
