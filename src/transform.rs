// src/transform.rs

//! Asset transform task: run external transformers (purify, minify) in order
//! and publish the resulting file to every configured destination.

use std::path::PathBuf;

use crate::logging::error_style;
use serde::Deserialize;
use tracing::{error, info};

use crate::context::TaskContext;
use crate::engine::{TaskFailure, TaskOutcome};
use crate::exec::invoker::{CommandSpec, invoke};

/// Payload of a `transform` task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformSpec {
    /// Commands run one after another; the first failure stops the task.
    pub steps: Vec<CommandSpec>,
    /// File the last step produces, relative to the project root.
    pub output: PathBuf,
    /// Where `output` is copied afterwards.
    #[serde(default)]
    pub publish: Vec<PathBuf>,
}

pub async fn run_transform(spec: &TransformSpec, ctx: &TaskContext) -> TaskOutcome {
    for step in &spec.steps {
        let outcome = invoke(step, ctx).await;
        if !outcome.is_success() {
            return outcome;
        }
    }

    let output = ctx.resolve(&spec.output);
    for dest in &spec.publish {
        let dest = ctx.resolve(dest);
        if dest == output {
            continue;
        }
        if let Err(err) = ctx.fs().copy(&output, &dest) {
            let failure = TaskFailure::Io(format!(
                "publishing {} to {}: {err:#}",
                output.display(),
                dest.display()
            ));
            error!("{}", error_style(&failure));
            return TaskOutcome::Failed(failure);
        }
        info!(to = %dest.display(), "published {}", spec.output.display());
    }

    TaskOutcome::Success
}
