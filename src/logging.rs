// src/logging.rs

//! `tracing` subscriber setup.
//!
//! The filter is taken from `--log-level` when given, otherwise from
//! `LARK_LOG`, which accepts any `EnvFilter` directive (`debug`,
//! `lark::task=info,lark=warn`, ...). An unset or unparsable `LARK_LOG`
//! falls back to `info`.
//!
//! Output goes to stderr; stdout belongs to the commands lark runs.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "LARK_LOG";

/// Install the global subscriber. Call once, before any task runs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(cli_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    }
}
