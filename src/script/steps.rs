// src/script/steps.rs

//! Executing task-file steps against a [`Context`].

use std::sync::Arc;

use tracing::debug;

use crate::config::model::{Step, TaskFile};
use crate::engine::Engine;
use crate::errors::Result;
use crate::exec::{ExecOptions, ProcessSpec};
use crate::script::template::expand;
use crate::task::Context;

/// Register every task of `file` with `engine`, in file order.
pub fn register_task_file(engine: &Engine, file: &TaskFile) -> Result<()> {
    for task in &file.task {
        let steps: Arc<[Step]> = task.steps.clone().into();
        let body = move |ctx: Context| {
            let steps = Arc::clone(&steps);
            async move { run_steps(&ctx, &steps).await }
        };

        match (&task.name, &task.pattern) {
            (Some(name), _) => engine.register(name, body)?,
            (None, Some(pattern)) => engine.register_pattern(pattern, body)?,
            // Rejected by validation.
            (None, None) => {}
        }
    }
    Ok(())
}

/// Run steps in order; the first failing step aborts the body.
pub async fn run_steps(ctx: &Context, steps: &[Step]) -> Result<()> {
    for (idx, step) in steps.iter().enumerate() {
        debug!(task = %ctx.name(), step = idx, "running step");
        run_step(ctx, step).await?;
    }
    Ok(())
}

async fn run_step(ctx: &Context, step: &Step) -> Result<()> {
    let fill = |s: &str| expand(s, ctx.name(), ctx.all_captures());

    match step {
        Step::Run { run } => ctx.run(&fill(run.as_str())?).await,
        Step::Exec { exec, options } => {
            let spec = build_spec(ctx, exec, options)?;
            ctx.exec(spec).await
        }
        Step::Start {
            start,
            group,
            options,
        } => {
            let spec = build_spec(ctx, start, options)?;
            ctx.start(spec, &fill(group.as_str())?)
        }
        Step::MakeGroup { make_group, follows } => {
            let follows = follows
                .as_slice()
                .iter()
                .map(|f| fill(f.as_str()))
                .collect::<Result<Vec<_>>>()?;
            ctx.make_group(&fill(make_group.as_str())?, follows)
        }
        Step::Wait { wait } => {
            let names = wait
                .as_slice()
                .iter()
                .map(|n| fill(n.as_str()))
                .collect::<Result<Vec<_>>>()?;
            ctx.wait(&names).await
        }
        Step::Log { log } => {
            ctx.log(&fill(log.as_str())?);
            Ok(())
        }
    }
}

fn build_spec(ctx: &Context, argv: &[String], options: &ExecOptions) -> Result<ProcessSpec> {
    let captures = ctx.all_captures();
    let fill = |s: &str| expand(s, ctx.name(), captures);
    let fill_opt = |s: &Option<String>| s.as_deref().map(fill).transpose();

    let argv = argv
        .iter()
        .map(|a| fill(a.as_str()))
        .collect::<Result<Vec<_>>>()?;

    let mut env = options.env.clone();
    for value in env.values_mut() {
        *value = fill(value.as_str())?;
    }

    let options = ExecOptions {
        dir: fill_opt(&options.dir)?,
        env,
        input: fill_opt(&options.input)?,
        stdin: fill_opt(&options.stdin)?,
        stdout: fill_opt(&options.stdout)?,
        stderr: fill_opt(&options.stderr)?,
        ignore: options.ignore,
    };

    ProcessSpec::with_options(argv, options)
}
