// src/dag/scheduler_step.rs

//! Step-by-step result type for the scheduler.

use crate::dag::task_info::ScheduledInvocation;
use crate::engine::InvocationId;

/// Structured result of a single scheduler step.
///
/// Tests use it to step the plan by hand and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Invocations that became ready in this step.
    pub newly_scheduled: Vec<ScheduledInvocation>,
    /// Pending invocations dropped because of a failure in this step.
    pub newly_skipped: Vec<InvocationId>,
    /// Whether this step ended the run, successfully or not.
    pub run_just_finished: bool,
}
