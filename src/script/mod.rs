// src/script/mod.rs

//! Turning task-file entries into task bodies.
//!
//! - [`template`] fills `{name}` / `{N}` placeholders from the running
//!   task's context.
//! - [`steps`] registers task-file tasks and interprets their steps.

pub mod steps;
pub mod template;

pub use steps::{register_task_file, run_steps};
