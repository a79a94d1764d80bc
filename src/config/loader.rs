// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawTaskFile, TaskFile};
use crate::errors::Result;

/// Load a task file from `path` without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawTaskFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Parse task-file TOML from a string without semantic validation.
pub fn parse_str(contents: &str) -> Result<RawTaskFile> {
    let file: RawTaskFile = toml::from_str(contents)?;
    Ok(file)
}

/// Load a task file from `path` and validate it.
///
/// This is the entry point the CLI uses:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks task keys, step options, placeholders, and that literal
///   `make_group` follows edges are acyclic.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<TaskFile> {
    let raw = load_from_path(path)?;
    TaskFile::try_from(raw)
}

/// Task file used when `--file` is not given.
pub const DEFAULT_TASK_FILE: &str = "lark.toml";
