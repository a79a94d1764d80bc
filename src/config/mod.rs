// src/config/mod.rs

//! Task-file loading and validation.
//!
//! The task file is a declarative stand-in for a task script: each
//! `[[task]]` is registered with the engine and its steps call the same
//! operations a script would (`run`, `exec`, `start`, `make_group`, `wait`).
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a file from disk.
//! - `validate.rs`: `RawTaskFile -> TaskFile` with semantic checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, DEFAULT_TASK_FILE};
pub use model::{ConfigSection, RawTaskFile, Step, TaskConfig, TaskFile};
