// src/exec/task_runner.rs

//! Runs the action of one invocation.

use std::path::PathBuf;

use crate::logging::error_style;
use tracing::{error, info, warn};

use crate::context::TaskContext;
use crate::deps::copy_dependencies;
use crate::engine::{Sequencer, TaskFailure, TaskOutcome};
use crate::exec::invoker::invoke;
use crate::registry::{Task, TaskAction};
use crate::serve::run_serve;
use crate::transform::run_transform;
use crate::watch::run_watch;

/// Execute `task`'s own action. Prerequisites are separate invocations and
/// have already run by the time this is called.
pub async fn run_invocation(task: &Task, sequencer: &Sequencer) -> TaskOutcome {
    let ctx = sequencer.context();

    match &task.action {
        TaskAction::Command(spec) => invoke(spec, ctx).await,
        TaskAction::Clean { paths } => clean(paths, ctx),
        TaskAction::CopyDeps(spec) => {
            let report = copy_dependencies(ctx.fs(), ctx.root(), spec);
            if report.failed > 0 {
                warn!(
                    task = %task.name,
                    failed = report.failed,
                    "some dependency entries could not be copied"
                );
            }
            info!(
                task = %task.name,
                copied = report.copied,
                unchanged = report.unchanged,
                "dependencies copied"
            );
            TaskOutcome::Success
        }
        TaskAction::Transform(spec) => run_transform(spec, ctx).await,
        TaskAction::Serve(spec) => run_serve(spec, ctx).await,
        TaskAction::Watch(spec) => run_watch(spec, sequencer.clone()).await,
        // Expanded inline when planning.
        TaskAction::Sequence(_) => TaskOutcome::Success,
    }
}

/// Remove `paths` below the project root. Missing paths are fine.
fn clean(paths: &[PathBuf], ctx: &TaskContext) -> TaskOutcome {
    for path in paths {
        let full = ctx.resolve(path);
        if let Err(err) = ctx.fs().remove_all(&full) {
            let failure = TaskFailure::Io(format!("removing {}: {err:#}", full.display()));
            error!("{}", error_style(&failure));
            return TaskOutcome::Failed(failure);
        }
        info!(path = %full.display(), "removed");
    }
    TaskOutcome::Success
}
