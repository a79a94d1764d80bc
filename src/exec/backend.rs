// src/exec/backend.rs

//! Pluggable process backend.
//!
//! The executor talks to a `ProcessBackend` instead of spawning processes
//! directly, so tests can substitute a fake that records argv and reports
//! canned outcomes without touching the OS.
//!
//! - `SystemBackend` is the default implementation, built on
//!   `tokio::process::Command`.

use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{ProcessError, Result};
use crate::exec::redirect::open_streams;
use crate::exec::spec::ProcessSpec;

/// Runs one fully-specified external command to completion.
pub trait ProcessBackend: Send + Sync {
    /// Resolve streams, spawn, and wait. `Ok` only on a zero exit status.
    fn spawn_and_wait<'a>(
        &'a self,
        spec: &'a ProcessSpec,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Real backend used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackend;

impl ProcessBackend for SystemBackend {
    fn spawn_and_wait<'a>(
        &'a self,
        spec: &'a ProcessSpec,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(run_command(spec))
    }
}

async fn run_command(spec: &ProcessSpec) -> Result<()> {
    let streams = open_streams(spec)?;

    let mut cmd = Command::new(spec.program());
    cmd.args(spec.args())
        .envs(&spec.env)
        .stdin(streams.stdin)
        .stdout(streams.stdout)
        .stderr(streams.stderr);

    if let Some(dir) = &spec.dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| ProcessError::Spawn {
        program: spec.program().to_string(),
        source: e.into(),
    })?;

    if let Some(input) = streams.input {
        if let Some(mut stdin) = child.stdin.take() {
            let program = spec.program().to_string();
            // Feed stdin concurrently so a child that writes before reading
            // cannot deadlock against us.
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    warn!(program = %program, error = %e, "writing stdin input failed");
                }
                // Dropping `stdin` closes the pipe.
            });
        }
    }

    let status = child.wait().await.map_err(|e| ProcessError::Spawn {
        program: spec.program().to_string(),
        source: e.into(),
    })?;

    debug!(
        program = %spec.program(),
        exit_code = ?status.code(),
        success = status.success(),
        "process exited"
    );

    if status.success() {
        Ok(())
    } else {
        Err(ProcessError::Exit {
            program: spec.program().to_string(),
            code: status.code(),
        }
        .into())
    }
}
