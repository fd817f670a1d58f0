// src/engine/sequencer.rs

//! Entry point for running sequences.
//!
//! The CLI runs the requested task through a [`Sequencer`]; watch reactions
//! hold a clone of the same sequencer and re-run their sequences with it.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::context::TaskContext;
use crate::dag::{Plan, Sequence};
use crate::engine::core::CoreRuntime;
use crate::engine::runtime::Runtime;
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::exec::{ExecutorBackend, RealExecutorBackend};
use crate::registry::Registry;

/// Capacity of the per-run completion channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Sequencer {
    registry: Arc<Registry>,
    ctx: Arc<TaskContext>,
}

impl Sequencer {
    pub fn new(registry: Arc<Registry>, ctx: Arc<TaskContext>) -> Self {
        Self { registry, ctx }
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Expand `sequence` without running anything.
    pub fn plan(&self, sequence: &Sequence) -> Result<Plan> {
        Plan::build(&self.registry, sequence)
    }

    /// Run a single task (with its prerequisites).
    pub async fn run_task(&self, name: &str) -> Result<()> {
        self.run(&Sequence::single(name)).await
    }

    /// Run `sequence` with the real executor.
    pub async fn run(&self, sequence: &Sequence) -> Result<()> {
        let sequencer = self.clone();
        self.run_with(sequence, move |tx| RealExecutorBackend::new(tx, sequencer))
            .await
    }

    /// Run `sequence`, letting the caller pick the executor backend.
    ///
    /// `make_executor` receives the sender the backend must report
    /// completions on.
    pub async fn run_with<E, F>(&self, sequence: &Sequence, make_executor: F) -> Result<()>
    where
        E: ExecutorBackend,
        F: FnOnce(mpsc::Sender<RuntimeEvent>) -> E,
    {
        let plan = self.plan(sequence)?;
        info!(sequence = %sequence, invocations = plan.len(), "running sequence");

        let started = Instant::now();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let executor = make_executor(tx);
        let runtime = Runtime::new(CoreRuntime::new(&plan), rx, executor);

        let result = runtime.run().await;
        match &result {
            Ok(()) => info!(sequence = %sequence, "finished after {:.2?}", started.elapsed()),
            Err(err) => warn!(sequence = %sequence, "stopped after {:.2?}: {err}", started.elapsed()),
        }
        result
    }
}
