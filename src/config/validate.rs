// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{RawTaskFile, Step, TaskConfig, TaskFile};
use crate::errors::{LarkError, Result};
use crate::exec::ProcessSpec;
use crate::script::template;

impl TryFrom<RawTaskFile> for TaskFile {
    type Error = LarkError;

    fn try_from(raw: RawTaskFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_task_file(&raw)?;
        Ok(TaskFile::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_task_file(file: &RawTaskFile) -> Result<()> {
    ensure_has_tasks(file)?;
    validate_task_keys(file)?;
    for task in &file.task {
        for (idx, step) in task.steps.iter().enumerate() {
            validate_step(step).map_err(|e| {
                LarkError::Config(format!("{} step {}: {}", task.label(), idx + 1, e))
            })?;
        }
    }
    validate_group_follows(file)?;
    Ok(())
}

fn ensure_has_tasks(file: &RawTaskFile) -> Result<()> {
    if file.task.is_empty() {
        return Err(LarkError::Config(
            "task file must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_keys(file: &RawTaskFile) -> Result<()> {
    let mut seen = HashSet::new();

    for (idx, task) in file.task.iter().enumerate() {
        match (&task.name, &task.pattern) {
            (Some(_), Some(_)) => {
                return Err(LarkError::Config(format!(
                    "[[task]] #{} sets both `name` and `pattern`",
                    idx + 1
                )));
            }
            (None, None) => {
                return Err(LarkError::Config(format!(
                    "[[task]] #{} needs either `name` or `pattern`",
                    idx + 1
                )));
            }
            (Some(name), None) => {
                if name.is_empty() {
                    return Err(LarkError::Config(format!(
                        "[[task]] #{} has an empty name",
                        idx + 1
                    )));
                }
                if !seen.insert(name.as_str()) {
                    return Err(LarkError::Config(format!(
                        "task '{name}' is defined more than once"
                    )));
                }
            }
            (None, Some(pattern)) => {
                Regex::new(pattern).map_err(|e| {
                    LarkError::Config(format!("{}: invalid pattern: {e}", task.label()))
                })?;
            }
        }
    }
    Ok(())
}

fn validate_step(step: &Step) -> Result<()> {
    match step {
        Step::Run { run } => template::check(run),
        Step::Exec { exec: argv, options } | Step::Start { start: argv, options, .. } => {
            for s in argv.iter().chain(options.env.values()) {
                template::check(s)?;
            }
            for s in [
                &options.dir,
                &options.input,
                &options.stdin,
                &options.stdout,
                &options.stderr,
            ]
            .into_iter()
            .flatten()
            {
                template::check(s)?;
            }
            if let Step::Start { group, .. } = step {
                template::check(group)?;
            }
            // Catches empty argv, stdin/input conflicts and bad `&` tokens.
            ProcessSpec::with_options(argv.clone(), options.clone()).map(|_| ())
        }
        Step::MakeGroup { make_group, follows } => {
            template::check(make_group)?;
            follows.as_slice().iter().try_for_each(|f| template::check(f))
        }
        Step::Wait { wait } => wait.as_slice().iter().try_for_each(|w| template::check(w)),
        Step::Log { log } => template::check(log),
    }
}

/// The `follows` edges declared by `make_group` steps must form a DAG.
///
/// Only literal group names are considered; names built from placeholders
/// are resolved at run time and cannot be checked here.
fn validate_group_follows(file: &RawTaskFile) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for step in file.task.iter().flat_map(|t: &TaskConfig| t.steps.iter()) {
        if let Step::MakeGroup { make_group, follows } = step {
            if is_templated(make_group) {
                continue;
            }
            graph.add_node(make_group.as_str());
            for dep in follows.as_slice() {
                if is_templated(dep) {
                    continue;
                }
                if dep == make_group {
                    return Err(LarkError::Config(format!(
                        "group '{make_group}' cannot follow itself"
                    )));
                }
                // Edge direction: followed -> follower.
                graph.add_edge(dep.as_str(), make_group.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(LarkError::CycleDetected(format!(
            "group follows form a cycle involving group '{}'",
            cycle.node_id()
        ))),
    }
}

fn is_templated(s: &str) -> bool {
    s.contains('{')
}
