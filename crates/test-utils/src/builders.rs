#![allow(dead_code)]

use lark::config::{ConfigSection, RawTaskFile, Step, TaskConfig, TaskFile};
use lark::exec::ExecOptions;
use lark::types::{ErrorMode, OneOrMany};

/// Builder for `TaskFile` to simplify test setup.
pub struct TaskFileBuilder {
    file: RawTaskFile,
}

impl TaskFileBuilder {
    pub fn new() -> Self {
        Self {
            file: RawTaskFile {
                config: ConfigSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.file.task.push(task);
        self
    }

    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.file.config.error_mode = mode;
        self
    }

    pub fn detect_cycles(mut self, val: bool) -> Self {
        self.file.config.detect_cycles = val;
        self
    }

    pub fn raw(self) -> RawTaskFile {
        self.file
    }

    pub fn build(self) -> TaskFile {
        TaskFile::try_from(self.file).expect("Failed to build valid task file from builder")
    }
}

impl Default for TaskFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one `[[task]]` entry.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn named(name: &str) -> Self {
        Self {
            task: TaskConfig {
                name: Some(name.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn pattern(expr: &str) -> Self {
        Self {
            task: TaskConfig {
                pattern: Some(expr.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn run(mut self, task: &str) -> Self {
        self.task.steps.push(Step::Run {
            run: task.to_string(),
        });
        self
    }

    pub fn exec(self, argv: &[&str]) -> Self {
        self.exec_with(argv, ExecOptions::default())
    }

    pub fn exec_with(mut self, argv: &[&str], options: ExecOptions) -> Self {
        self.task.steps.push(Step::Exec {
            exec: argv.iter().map(|s| s.to_string()).collect(),
            options,
        });
        self
    }

    pub fn start(self, argv: &[&str], group: &str) -> Self {
        self.start_with(argv, group, ExecOptions::default())
    }

    pub fn start_with(mut self, argv: &[&str], group: &str, options: ExecOptions) -> Self {
        self.task.steps.push(Step::Start {
            start: argv.iter().map(|s| s.to_string()).collect(),
            group: group.to_string(),
            options,
        });
        self
    }

    pub fn make_group(mut self, name: &str, follows: &[&str]) -> Self {
        self.task.steps.push(Step::MakeGroup {
            make_group: name.to_string(),
            follows: OneOrMany::Many(follows.iter().map(|s| s.to_string()).collect()),
        });
        self
    }

    pub fn wait(mut self, groups: &[&str]) -> Self {
        self.task.steps.push(Step::Wait {
            wait: OneOrMany::Many(groups.iter().map(|s| s.to_string()).collect()),
        });
        self
    }

    pub fn log(mut self, msg: &str) -> Self {
        self.task.steps.push(Step::Log {
            log: msg.to_string(),
        });
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
