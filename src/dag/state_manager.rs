// src/dag/state_manager.rs

//! Per-run state transitions for planned invocations.

use std::time::Instant;

use tracing::{debug, info};

use crate::dag::graph::InvocationGraph;
use crate::dag::task_info::{RunState, ScheduledInvocation, TaskRun};
use crate::engine::InvocationId;

/// Mutating view over the runs of one plan.
pub struct StateManager<'a> {
    graph: &'a InvocationGraph,
    runs: &'a mut [TaskRun],
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a InvocationGraph, runs: &'a mut [TaskRun]) -> Self {
        Self { graph, runs }
    }

    /// Collect `Pending` invocations whose dependencies all succeeded, mark
    /// them `Running` and return them in plan order.
    pub fn collect_new_ready(&mut self) -> Vec<ScheduledInvocation> {
        let candidates: Vec<InvocationId> = {
            let ro = ReadOnlyStateManager::new(self.graph, &*self.runs);
            self.runs
                .iter()
                .filter(|run| run.state == RunState::Pending && ro.deps_satisfied(run.id))
                .map(|run| run.id)
                .collect()
        };

        let mut ready = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(run) = self.runs.get_mut(id) {
                info!(task = %run.name(), invocation = id, "starting");
                run.state = RunState::Running;
                run.started_at = Some(Instant::now());
                ready.push(ScheduledInvocation::from_run(run));
            }
        }
        ready
    }

    /// Mark every still-`Pending` invocation `Skipped`.
    ///
    /// Running invocations are left alone; they finish on their own and their
    /// results no longer matter.
    pub fn skip_pending(&mut self) -> Vec<InvocationId> {
        let mut skipped = Vec::new();
        for run in self.runs.iter_mut() {
            if run.state == RunState::Pending {
                debug!(task = %run.name(), invocation = run.id, "skipping after earlier failure");
                run.state = RunState::Skipped;
                skipped.push(run.id);
            }
        }
        skipped
    }

    pub fn all_terminal(&self) -> bool {
        ReadOnlyStateManager::new(self.graph, &*self.runs).all_terminal()
    }
}

/// Read-only view used for dependency checks.
pub struct ReadOnlyStateManager<'a> {
    graph: &'a InvocationGraph,
    runs: &'a [TaskRun],
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(graph: &'a InvocationGraph, runs: &'a [TaskRun]) -> Self {
        Self { graph, runs }
    }

    /// All direct dependencies of `id` finished successfully.
    pub fn deps_satisfied(&self, id: InvocationId) -> bool {
        self.graph.dependencies_of(id).iter().all(|&dep| {
            self.runs
                .get(dep)
                .is_some_and(|run| run.state == RunState::DoneSuccess)
        })
    }

    pub fn all_terminal(&self) -> bool {
        self.runs.iter().all(|run| run.state.is_terminal())
    }
}
