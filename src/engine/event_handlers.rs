// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use crate::dag::{ScheduledInvocation, Scheduler};
use crate::engine::{InvocationId, TaskFailure, TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these invocations to the executor.
    DispatchTasks(Vec<ScheduledInvocation>),
    /// The run failed; stop and report this failure.
    Abort { task: TaskName, failure: TaskFailure },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Seed the run: dispatch every invocation without dependencies.
pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.step_start();
    let mut commands = Vec::new();
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    CoreStep {
        commands,
        keep_running: !scheduler.is_finished(),
    }
}

/// Handle an invocation completion.
///
/// On success, newly ready invocations are dispatched. On the first failure
/// the core emits `Abort` and stops; anything still running is left to
/// finish unobserved.
pub fn handle_invocation_completion(
    scheduler: &mut Scheduler,
    id: InvocationId,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.step_completion(id, outcome);
    let mut commands = Vec::new();

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    if step.run_just_finished {
        if let Some((task, failure)) = scheduler.failure() {
            commands.push(CoreCommand::Abort {
                task: task.clone(),
                failure: failure.clone(),
            });
        }
    }

    CoreStep {
        commands,
        keep_running: !scheduler.is_finished(),
    }
}
