// src/exec/executor.rs

//! The process executor: ignore semantics and parallelism limits around a
//! [`ProcessBackend`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::errors::{LarkError, Result};
use crate::exec::backend::{ProcessBackend, SystemBackend};
use crate::exec::spec::ProcessSpec;

#[derive(Clone)]
pub struct ProcessExecutor {
    backend: Arc<dyn ProcessBackend>,
    /// Caps concurrently running processes started via `run_limited`.
    limiter: Option<Arc<Semaphore>>,
    verbose: bool,
}

impl fmt::Debug for ProcessExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessExecutor")
            .field("parallelism", &self.limiter.as_ref().map(|s| s.available_permits()))
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(Arc::new(SystemBackend), None, false)
    }
}

impl ProcessExecutor {
    /// `parallelism` of `None` or `Some(0)` means unbounded.
    pub fn new(
        backend: Arc<dyn ProcessBackend>,
        parallelism: Option<usize>,
        verbose: bool,
    ) -> Self {
        let limiter = parallelism
            .filter(|&n| n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        Self {
            backend,
            limiter,
            verbose,
        }
    }

    /// Run `spec` to completion.
    ///
    /// A failure (spawn error, redirection error, non-zero exit) is returned
    /// unless `spec.ignore` is set, in which case it is logged and dropped.
    pub async fn run(&self, spec: &ProcessSpec) -> Result<()> {
        info!(argv = ?spec.argv, dir = ?spec.dir, "exec");

        match self.backend.spawn_and_wait(spec).await {
            Ok(()) => Ok(()),
            Err(err) if spec.ignore => {
                self.log_ignored(spec, &err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Like [`run`](Self::run), but waits for a parallelism permit first.
    pub async fn run_limited(&self, spec: &ProcessSpec) -> Result<()> {
        let _permit = match &self.limiter {
            Some(sem) => Some(
                Arc::clone(sem)
                    .acquire_owned()
                    .await
                    .map_err(anyhow::Error::from)?,
            ),
            None => None,
        };
        self.run(spec).await
    }

    fn log_ignored(&self, spec: &ProcessSpec, err: &LarkError) {
        if self.verbose {
            warn!(argv = ?spec.argv, error = %err, "ignored command failure");
        } else {
            debug!(argv = ?spec.argv, error = %err, "ignored command failure");
        }
    }
}
