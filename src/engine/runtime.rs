// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledInvocation;
use crate::errors::{Result, SitepipeError};
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Drives one plan to completion in response to `RuntimeEvent`s and delegates
/// the actual work to an `ExecutorBackend`.
///
/// This is an IO shell around `CoreRuntime`, which holds all the sequencing
/// semantics. This struct only reads events and dispatches invocations.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// Returns `Ok(())` once every invocation succeeded, or
    /// [`SitepipeError::TaskFailed`] for the first failure.
    pub async fn run(mut self) -> Result<()> {
        let start = self.core.start();
        if !self.apply(start).await? {
            return Ok(());
        }

        loop {
            let Some(event) = self.event_rx.recv().await else {
                return Err(SitepipeError::Other(anyhow!(
                    "executor stopped before the sequence finished"
                )));
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            if !self.apply(step).await? {
                return Ok(());
            }
        }
    }

    /// Execute the commands of one core step. Returns whether to keep going.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
                CoreCommand::Abort { task, failure } => {
                    info!(task = %task, "sequence aborted");
                    return Err(SitepipeError::TaskFailed { task, failure });
                }
            }
        }
        Ok(step.keep_running)
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledInvocation>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name().as_str()).collect();
        debug!(?names, "dispatching ready invocations");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
