// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can swap in a fake executor while production uses
//! [`RealExecutorBackend`].
//!
//! - `RealExecutorBackend` wraps the [`spawn_executor`] loop and forwards
//!   scheduled invocations over an mpsc channel.
//! - Tests provide their own `ExecutorBackend` that records what was
//!   dispatched and emits `InvocationCompleted` events directly.

use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::dag::ScheduledInvocation;
use crate::engine::{RuntimeEvent, Sequencer};
use crate::errors::{Result, SitepipeError};

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled invocations are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given invocations for execution.
    ///
    /// Each one must eventually produce exactly one
    /// `RuntimeEvent::InvocationCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledInvocation>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// The runtime calls `spawn_ready_tasks`, which forwards the invocations to
/// the background executor loop.
#[derive(Debug)]
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledInvocation>,
}

impl RealExecutorBackend {
    /// Spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, sequencer: Sequencer) -> Self {
        let tx = spawn_executor(runtime_tx, sequencer);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledInvocation>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task)
                    .await
                    .map_err(|_| SitepipeError::Other(anyhow!("executor loop is gone")))?;
            }
            Ok(())
        })
    }
}
