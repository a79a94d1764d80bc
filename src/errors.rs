// src/errors.rs

//! Crate-wide error types.
//!
//! `LarkError` is `Clone` because a group's recorded error is handed out by
//! every `wait` on that group; non-clonable sources are kept behind an `Arc`.

use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LarkError {
    /// Malformed call into the scripting-facing API.
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("no such task: {0:?}")]
    NoSuchTask(String),

    #[error("no default task")]
    NoDefaultTask,

    #[error("group already exists: {0:?}")]
    GroupConflict(String),

    #[error("task cycle detected: {0}")]
    CycleDetected(String),

    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A group-recorded error surfaced through `wait`/`drain`.
    #[error("asynchronous error: {source}")]
    Async {
        group: String,
        #[source]
        source: Box<LarkError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("TOML parsing error: {0}")]
    Toml(Arc<toml::de::Error>),

    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

/// Failure of a single external command.
#[derive(Error, Debug, Clone)]
pub enum ProcessError {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("{program:?} exited with {}", exit_description(.code))]
    Exit { program: String, code: Option<i32> },

    #[error("cannot redirect {path:?}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl LarkError {
    /// Wrap an error recorded by `group` so that it reads as asynchronous.
    pub fn asynchronous(group: &str, source: LarkError) -> Self {
        LarkError::Async {
            group: group.to_string(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `Async` wrappers.
    pub fn root(&self) -> &LarkError {
        match self {
            LarkError::Async { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for LarkError {
    fn from(err: std::io::Error) -> Self {
        LarkError::Io(Arc::new(err))
    }
}

impl From<toml::de::Error> for LarkError {
    fn from(err: toml::de::Error) -> Self {
        LarkError::Toml(Arc::new(err))
    }
}

impl From<anyhow::Error> for LarkError {
    fn from(err: anyhow::Error) -> Self {
        LarkError::Other(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, LarkError>;
