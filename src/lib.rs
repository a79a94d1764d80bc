// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod group;
pub mod logging;
pub mod script;
pub mod task;
pub mod types;

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing::{debug, error, info};

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::load_and_validate;
use crate::config::model::TaskFile;
use crate::engine::{Engine, EngineOptions};
use crate::errors::LarkError;
use crate::script::register_task_file;
use crate::task::TaskKey;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task-file loading and validation
/// - engine construction from CLI flags and `[config]`
/// - registering task-file tasks
/// - running (and draining) the requested tasks, or listing them
///
/// Task failures are logged here and turned into a failing exit code;
/// the `Err` path is reserved for problems loading the task file.
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let file = load_and_validate(&args.file)
        .with_context(|| format!("loading task file {:?}", args.file))?;

    let command = args
        .command
        .clone()
        .unwrap_or_else(|| Command::Run(RunArgs::from_env()));

    match command {
        Command::List => {
            let engine = build_engine(&file, &RunArgs::default())?;
            print_tasks(&engine);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(run_args) => {
            let engine = build_engine(&file, &run_args)?;
            info!(tasks = ?run_args.tasks, "lark run");

            match engine.run_all(&run_args.tasks).await {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(err) => {
                    report_failure(&err, run_args.verbose);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn build_engine(file: &TaskFile, run_args: &RunArgs) -> Result<Engine> {
    let options = EngineOptions {
        parallelism: run_args.jobs.or(file.config.parallelism),
        verbose: run_args.verbose,
        error_mode: file.config.error_mode,
        detect_cycles: file.config.detect_cycles,
    };
    debug!(?options, "engine options");

    let engine = Engine::new(options);
    register_task_file(&engine, file).context("registering tasks")?;
    Ok(engine)
}

/// Top-level failures are reported once, at `error` level. Verbose mode
/// includes the full structured error.
fn report_failure(err: &LarkError, verbose: bool) {
    if verbose {
        error!("{err:?}");
    } else {
        error!("{err}");
    }
}

fn print_tasks(engine: &Engine) {
    let keys = engine.task_keys();
    println!("tasks ({}):", keys.len());
    for (idx, key) in keys.iter().enumerate() {
        let marker = if idx == 0 { " (default)" } else { "" };
        match key {
            TaskKey::Exact(name) => println!("  - {name}{marker}"),
            TaskKey::Pattern(_) => println!("  - {key}{marker}"),
        }
    }
}
