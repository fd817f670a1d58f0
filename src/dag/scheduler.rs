// src/dag/scheduler.rs

use crate::logging::error_style;
use tracing::{debug, error, info, warn};

use crate::dag::graph::InvocationGraph;
use crate::dag::plan::Plan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledInvocation, TaskRun};
use crate::engine::{InvocationId, TaskFailure, TaskName, TaskOutcome};

/// Scheduler holds the immutable invocation graph plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when a planned invocation is ready (all deps succeeded)
/// - marking invocations as succeeded or failed
/// - recording the first failure and skipping everything not yet started
#[derive(Debug)]
pub struct Scheduler {
    graph: InvocationGraph,
    runs: Vec<TaskRun>,
    /// First failure of this run; later failures are ignored.
    failure: Option<(TaskName, TaskFailure)>,
    finished: bool,
}

impl Scheduler {
    pub fn new(plan: &Plan) -> Self {
        let graph = InvocationGraph::from_plan(plan);
        let runs = plan
            .invocations()
            .iter()
            .map(TaskRun::from_invocation)
            .collect();

        Self {
            graph,
            runs,
            failure: None,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The failure that ended the run, if any.
    pub fn failure(&self) -> Option<(&TaskName, &TaskFailure)> {
        self.failure.as_ref().map(|(t, f)| (t, f))
    }

    pub fn run_state_of(&self, id: InvocationId) -> Option<RunState> {
        self.runs.get(id).map(|r| r.state)
    }

    /// Whether the dependencies of `id` are satisfied. `None` if unknown.
    pub fn deps_satisfied(&self, id: InvocationId) -> Option<bool> {
        self.runs.get(id)?;
        Some(ReadOnlyStateManager::new(&self.graph, &self.runs).deps_satisfied(id))
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Start the run (production API).
    pub fn start(&mut self) -> Vec<ScheduledInvocation> {
        self.step_start().newly_scheduled
    }

    /// Handle completion of an invocation (production API).
    pub fn handle_completion(
        &mut self,
        id: InvocationId,
        outcome: TaskOutcome,
    ) -> Vec<ScheduledInvocation> {
        self.step_completion(id, outcome).newly_scheduled
    }

    /// Manual-step variant of `start`.
    pub fn step_start(&mut self) -> SchedulerStep {
        debug!(invocations = self.runs.len(), "scheduler: starting run");
        let mut manager = StateManager::new(&self.graph, &mut self.runs);
        let newly_scheduled = manager.collect_new_ready();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_skipped: Vec::new(),
            run_just_finished,
        }
    }

    /// Manual-step variant of `handle_completion`.
    pub fn step_completion(&mut self, id: InvocationId, outcome: TaskOutcome) -> SchedulerStep {
        if self.finished {
            debug!(invocation = id, "completion after run finished; ignoring");
            return SchedulerStep::default();
        }

        let Some(run) = self.runs.get_mut(id) else {
            warn!(invocation = id, "completion for unknown invocation; ignoring");
            return SchedulerStep::default();
        };

        if run.state != RunState::Running {
            warn!(
                task = %run.name(),
                invocation = id,
                state = ?run.state,
                "completion for invocation that is not running; ignoring"
            );
            return SchedulerStep::default();
        }

        let elapsed = run
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or_default();

        match outcome {
            TaskOutcome::Success => {
                run.state = RunState::DoneSuccess;
                info!(
                    task = %run.name(),
                    invocation = id,
                    "finished after {:.2?}",
                    elapsed
                );

                let mut manager = StateManager::new(&self.graph, &mut self.runs);
                let newly_scheduled = manager.collect_new_ready();
                let run_just_finished = self.maybe_finish_run();

                SchedulerStep {
                    newly_scheduled,
                    newly_skipped: Vec::new(),
                    run_just_finished,
                }
            }
            TaskOutcome::Failed(failure) => {
                run.state = RunState::DoneFailed;
                error!(
                    task = %run.name(),
                    invocation = id,
                    "{} after {:.2?}",
                    error_style("failed").bold(),
                    elapsed
                );
                let name = run.task.name.clone();

                let mut manager = StateManager::new(&self.graph, &mut self.runs);
                let newly_skipped = manager.skip_pending();
                self.failure = Some((name, failure));
                self.finished = true;

                SchedulerStep {
                    newly_scheduled: Vec::new(),
                    newly_skipped,
                    run_just_finished: true,
                }
            }
        }
    }

    /// Mark the run finished when every invocation is terminal.
    ///
    /// Returns `true` if this call did the transition.
    fn maybe_finish_run(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let manager = StateManager::new(&self.graph, &mut self.runs);
        if manager.all_terminal() {
            debug!("scheduler: all invocations terminal; run finished");
            self.finished = true;
            true
        } else {
            false
        }
    }
}
