// src/dag/task_info.rs

//! Invocation metadata and per-run state.

use std::sync::Arc;
use std::time::Instant;

use crate::dag::plan::Invocation;
use crate::engine::{InvocationId, TaskName};
use crate::registry::Task;

/// State of one invocation within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on dependencies.
    Pending,
    /// Dispatched to the executor.
    Running,
    DoneSuccess,
    DoneFailed,
    /// Never started because an earlier invocation failed.
    Skipped,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::DoneSuccess | RunState::DoneFailed | RunState::Skipped
        )
    }
}

/// A single invocation instance plus its run bookkeeping.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub id: InvocationId,
    pub task: Arc<Task>,
    pub deps: Vec<InvocationId>,
    pub state: RunState,
    /// Set when the invocation is dispatched.
    pub started_at: Option<Instant>,
}

impl TaskRun {
    pub fn from_invocation(inv: &Invocation) -> Self {
        Self {
            id: inv.id,
            task: Arc::clone(&inv.task),
            deps: inv.deps.clone(),
            state: RunState::Pending,
            started_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.task.name
    }
}

/// An invocation the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledInvocation {
    pub id: InvocationId,
    pub task: Arc<Task>,
}

impl ScheduledInvocation {
    pub fn from_run(run: &TaskRun) -> Self {
        Self {
            id: run.id,
            task: Arc::clone(&run.task),
        }
    }

    pub fn name(&self) -> &TaskName {
        &self.task.name
    }
}
