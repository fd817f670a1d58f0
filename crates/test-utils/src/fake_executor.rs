use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::dag::ScheduledInvocation;
use sitepipe::engine::{RuntimeEvent, TaskFailure, TaskOutcome};
use sitepipe::errors::{Result, SitepipeError};
use sitepipe::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// Shared log of task names in the order they were dispatched.
pub type ExecutionLog = Arc<Mutex<Vec<String>>>;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports completion for each dispatched invocation, failing
///   the ones configured with [`FakeExecutor::failing`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: ExecutionLog,
    failures: HashMap<String, i32>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: ExecutionLog) -> Self {
        Self {
            runtime_tx,
            executed,
            failures: HashMap::new(),
        }
    }

    /// Make every invocation of `task` exit with `code`.
    pub fn failing(mut self, task: &str, code: i32) -> Self {
        self.failures.insert(task.to_string(), code);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledInvocation>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failures = self.failures.clone();

        Box::pin(async move {
            for t in tasks {
                let name = t.name().clone();
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(name.clone());
                }

                let outcome = match failures.get(&name) {
                    Some(&code) => TaskOutcome::Failed(TaskFailure::Exit {
                        command: name.clone(),
                        code: Some(code),
                    }),
                    None => TaskOutcome::Success,
                };

                tx.send(RuntimeEvent::InvocationCompleted {
                    id: t.id,
                    task: name,
                    outcome,
                })
                .await
                .map_err(|e| SitepipeError::Other(anyhow::anyhow!("{e}")))?;
            }
            Ok(())
        })
    }
}

/// Fresh, empty execution log.
pub fn execution_log() -> ExecutionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of the log.
pub fn executed(log: &ExecutionLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
