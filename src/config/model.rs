// src/config/model.rs

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::exec::ExecOptions;
use crate::types::{ErrorMode, OneOrMany};

/// Top-level task file as read from TOML.
///
/// ```toml
/// [config]
/// error_mode = "first"
///
/// [[task]]
/// name = "build"
/// steps = [
///   { make_group = "link", follows = "objects" },
///   { run = "main.o" },
///   { start = ["cc", "-o", "main", "main.o"], group = "link" },
/// ]
///
/// [[task]]
/// pattern = '^(.+)\.o$'
/// steps = [
///   { start = ["cc", "-c", "{1}.c", "-o", "{0}"], group = "objects" },
/// ]
/// ```
///
/// Tasks are an array so that registration order (and so the default task
/// and pattern priority) follows file order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTaskFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated task file. Only constructible through
/// `TryFrom<RawTaskFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct TaskFile {
    pub config: ConfigSection,
    pub task: Vec<TaskConfig>,
}

impl TaskFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: Vec<TaskConfig>) -> Self {
        Self { config, task }
    }
}

/// `[config]` section: engine settings a task file may pin.
///
/// Command-line flags take precedence where both exist.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// `"first"` (default) or `"accumulate"`.
    #[serde(default)]
    pub error_mode: ErrorMode,

    /// Fail fast when a task re-enters itself through `run`.
    #[serde(default)]
    pub detect_cycles: bool,

    /// Default for `-j`.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

/// One `[[task]]` entry. Exactly one of `name` / `pattern` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Regular expression matched against requested task names.
    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl TaskConfig {
    /// Human-readable identity for messages.
    pub fn label(&self) -> String {
        match (&self.name, &self.pattern) {
            (Some(name), _) => format!("task '{name}'"),
            (None, Some(pattern)) => format!("pattern task /{pattern}/"),
            (None, None) => "unnamed task".to_string(),
        }
    }
}

/// One step of a task body; each maps onto one scripting-facing call.
///
/// A step is an inline table with exactly one action key (`run`, `exec`,
/// `start`, `make_group`, `wait`, `log`). Any key the action does not
/// accept is a parse error naming that key.
///
/// String fields may contain `{name}`, `{0}` and `{N}` placeholders, filled
/// in from the running task's context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "toml::Table")]
pub enum Step {
    /// `{ run = "other" }`
    Run { run: String },

    /// `{ exec = ["cc", "-c", "x.c"], stdout = "+log" }`
    Exec { exec: Vec<String>, options: ExecOptions },

    /// `{ start = [...], group = "objects" }`
    Start {
        start: Vec<String>,
        group: String,
        options: ExecOptions,
    },

    /// `{ make_group = "link", follows = ["objects"] }`
    MakeGroup { make_group: String, follows: OneOrMany },

    /// `{ wait = "objects" }`; an empty list waits on every group.
    Wait { wait: OneOrMany },

    /// `{ log = "building {name}" }`
    Log { log: String },
}

const ACTIONS: [&str; 6] = ["run", "exec", "start", "make_group", "wait", "log"];

impl TryFrom<toml::Table> for Step {
    type Error = String;

    fn try_from(mut table: toml::Table) -> Result<Self, Self::Error> {
        let present: Vec<&str> = ACTIONS
            .into_iter()
            .filter(|action| table.contains_key(*action))
            .collect();
        let action = match present.as_slice() {
            [action] => *action,
            [] => {
                return Err(format!(
                    "step needs one action key out of: {}",
                    ACTIONS.join(", ")
                ));
            }
            several => {
                return Err(format!(
                    "step has more than one action key: {}",
                    several.join(", ")
                ));
            }
        };

        // Whatever the action leaves in the table must be exec options.
        match action {
            "exec" => {
                let exec = take(&mut table, "exec")?;
                Ok(Step::Exec {
                    exec,
                    options: exec_options(action, table)?,
                })
            }
            "start" => {
                let start = take(&mut table, "start")?;
                let group = take_opt(&mut table, "group")?.unwrap_or_default();
                Ok(Step::Start {
                    start,
                    group,
                    options: exec_options(action, table)?,
                })
            }
            _ => {
                let step = match action {
                    "run" => Step::Run {
                        run: take(&mut table, "run")?,
                    },
                    "make_group" => Step::MakeGroup {
                        make_group: take(&mut table, "make_group")?,
                        follows: take_opt(&mut table, "follows")?.unwrap_or_default(),
                    },
                    "wait" => Step::Wait {
                        wait: take(&mut table, "wait")?,
                    },
                    _ => Step::Log {
                        log: take(&mut table, "log")?,
                    },
                };
                match table.keys().next() {
                    Some(key) => Err(format!("unknown field `{key}` in a `{action}` step")),
                    None => Ok(step),
                }
            }
        }
    }
}

fn take<T: DeserializeOwned>(table: &mut toml::Table, key: &str) -> Result<T, String> {
    take_opt(table, key)?.ok_or_else(|| format!("missing field `{key}`"))
}

fn take_opt<T: DeserializeOwned>(table: &mut toml::Table, key: &str) -> Result<Option<T>, String> {
    table
        .remove(key)
        .map(|value| {
            value
                .try_into::<T>()
                .map_err(|e| format!("invalid `{key}`: {e}"))
        })
        .transpose()
}

fn exec_options(action: &str, rest: toml::Table) -> Result<ExecOptions, String> {
    toml::Value::Table(rest)
        .try_into::<ExecOptions>()
        .map_err(|e| format!("in a `{action}` step: {e}"))
}
