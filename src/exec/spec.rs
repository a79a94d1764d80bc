// src/exec/spec.rs

//! Per-invocation process configuration.
//!
//! [`ExecOptions`] is the loose, user-facing shape (every field optional,
//! strings as written); [`ProcessSpec`] is the validated form the executor
//! consumes. Conversion happens eagerly so malformed options fail at the
//! call site with a field-level message.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::{LarkError, Result};

/// Reserved redirection token meaning "the invoking process's stdout".
pub const OWN_STDOUT: &str = "&1";
/// Reserved redirection token meaning "the invoking process's stderr".
pub const OWN_STDERR: &str = "&2";

/// Optional fields recognised by `exec` and `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecOptions {
    /// Working directory for the command.
    #[serde(default)]
    pub dir: Option<String>,

    /// Variables added on top of the ambient environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Literal content fed to the command's stdin.
    #[serde(default)]
    pub input: Option<String>,

    /// File whose content is fed to the command's stdin.
    #[serde(default)]
    pub stdin: Option<String>,

    /// Stdout target: a path, `+path` to append, `&1` or `&2`.
    #[serde(default)]
    pub stdout: Option<String>,

    /// Stderr target, same syntax as `stdout`.
    #[serde(default)]
    pub stderr: Option<String>,

    /// Suppress failures of this command.
    #[serde(default)]
    pub ignore: bool,
}

/// Where the child's stdin comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StdinSource {
    #[default]
    Inherit,
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Where a child's stdout or stderr goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// Same stream as the invoking process (the default).
    #[default]
    Inherit,
    /// The invoking process's own stdout (`&1`).
    OwnStdout,
    /// The invoking process's own stderr (`&2`).
    OwnStderr,
    File { path: PathBuf, append: bool },
}

impl OutputSink {
    /// Parse a redirection target.
    ///
    /// A leading `+` selects append mode; what remains is either one of the
    /// reserved tokens or a filesystem path. Any other `&`-prefixed value is
    /// rejected rather than treated as a path.
    pub fn parse(field: &str, target: &str) -> Result<Self> {
        let (append, rest) = match target.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, target),
        };

        match rest {
            "" => Err(LarkError::Argument(format!(
                "named value '{field}' is an empty path"
            ))),
            OWN_STDOUT => Ok(OutputSink::OwnStdout),
            OWN_STDERR => Ok(OutputSink::OwnStderr),
            other if other.starts_with('&') => Err(LarkError::Argument(format!(
                "named value '{field}' names an invalid file descriptor: {other:?}"
            ))),
            path => Ok(OutputSink::File {
                path: PathBuf::from(path),
                append,
            }),
        }
    }
}

/// Validated configuration for one external command.
///
/// Only built through [`new`](Self::new) or
/// [`with_options`](Self::with_options), so `argv` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub(crate) argv: Vec<String>,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) stdin: StdinSource,
    pub(crate) stdout: OutputSink,
    pub(crate) stderr: OutputSink,
    pub(crate) ignore: bool,
}

impl ProcessSpec {
    /// A spec with default streams, ambient environment and no working
    /// directory override. Fails if `argv` is empty.
    pub fn new<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(LarkError::Argument("missing positional values".to_string()));
        }
        if argv[0].is_empty() {
            return Err(LarkError::Argument("program name is empty".to_string()));
        }
        Ok(Self {
            argv,
            dir: None,
            env: BTreeMap::new(),
            stdin: StdinSource::Inherit,
            stdout: OutputSink::Inherit,
            stderr: OutputSink::Inherit,
            ignore: false,
        })
    }

    /// Build and validate a spec from user-facing options.
    pub fn with_options<I, S>(argv: I, opts: ExecOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::new(argv)?;

        if opts.input.is_some() && opts.stdin.is_some() {
            return Err(LarkError::Argument(
                "conflicting named values 'stdin' and 'input' both provided".to_string(),
            ));
        }

        spec.dir = opts.dir.map(PathBuf::from);
        spec.env = opts.env;
        spec.ignore = opts.ignore;

        if let Some(input) = opts.input {
            spec.stdin = StdinSource::Bytes(input.into_bytes());
        } else if let Some(path) = opts.stdin {
            if path.is_empty() {
                return Err(LarkError::Argument(
                    "named value 'stdin' is an empty path".to_string(),
                ));
            }
            spec.stdin = StdinSource::File(PathBuf::from(path));
        }

        if let Some(target) = opts.stdout.as_deref() {
            spec.stdout = OutputSink::parse("stdout", target)?;
        }
        if let Some(target) = opts.stderr.as_deref() {
            spec.stderr = OutputSink::parse("stderr", target)?;
        }

        Ok(spec)
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn input(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = StdinSource::Bytes(bytes.into());
        self
    }

    pub fn stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }
}
