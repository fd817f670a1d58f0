// src/exec/executor_loop.rs

//! Background loop that runs dispatched invocations.

use tokio::sync::mpsc;
use tracing::debug;

use crate::dag::ScheduledInvocation;
use crate::engine::{RuntimeEvent, Sequencer};
use crate::exec::task_runner::run_invocation;

/// Spawn the background executor loop.
///
/// Every invocation received on the returned sender runs in its own Tokio
/// task and reports back one `InvocationCompleted` on `runtime_tx`. The loop
/// ends when the sender is dropped; invocations already started keep running
/// to completion.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    sequencer: Sequencer,
) -> mpsc::Sender<ScheduledInvocation> {
    let (tx, mut rx) = mpsc::channel::<ScheduledInvocation>(32);

    tokio::spawn(async move {
        debug!("executor loop started");

        while let Some(scheduled) = rx.recv().await {
            let rt_tx = runtime_tx.clone();
            let sequencer = sequencer.clone();

            tokio::spawn(async move {
                let outcome = run_invocation(&scheduled.task, &sequencer).await;
                let event = RuntimeEvent::InvocationCompleted {
                    id: scheduled.id,
                    task: scheduled.task.name.clone(),
                    outcome,
                };
                if rt_tx.send(event).await.is_err() {
                    debug!(
                        task = %scheduled.task.name,
                        invocation = scheduled.id,
                        "runtime already stopped; dropping completion"
                    );
                }
            });
        }

        debug!("executor loop finished (channel closed)");
    });

    tx
}
