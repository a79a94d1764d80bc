// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_TASK_FILE;

/// Command-line arguments for `lark`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "lark",
    version,
    about = "Run project tasks with parallel, ordered execution groups.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML).
    #[arg(
        long,
        short = 'f',
        global = true,
        value_name = "PATH",
        default_value = DEFAULT_TASK_FILE
    )]
    pub file: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `LARK_LOG`; `info` when neither is set.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Defaults to `run` with no task names.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run task(s) from the task file.
    #[command(visible_alias = "make")]
    Run(RunArgs),

    /// List the tasks defined in the task file.
    List,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Number of parallel processes.
    #[arg(short = 'j', value_name = "N", env = "LARK_RUN_PARALLEL")]
    pub jobs: Option<usize>,

    /// Enable verbose reporting of errors.
    #[arg(short = 'v', env = "LARK_VERBOSE")]
    pub verbose: bool,

    /// Names of tasks to run; the default task if none are given.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,
}

impl RunArgs {
    /// Options for a bare `lark` invocation, where clap never saw the `run`
    /// flags: read their environment overrides directly.
    pub fn from_env() -> Self {
        let jobs = std::env::var("LARK_RUN_PARALLEL")
            .ok()
            .and_then(|s| s.trim().parse().ok());
        let verbose = std::env::var("LARK_VERBOSE")
            .map(|s| is_truthy(&s))
            .unwrap_or(false);
        Self {
            jobs,
            verbose,
            tasks: Vec::new(),
        }
    }
}

fn is_truthy(s: &str) -> bool {
    !matches!(
        s.trim().to_lowercase().as_str(),
        "" | "0" | "n" | "no" | "f" | "false" | "off"
    )
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The equivalent `EnvFilter` directive.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
