// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) reads events from a channel
//! and hands dispatched invocations to the executor. The core itself is unit
//! tested without any Tokio, channels, filesystem, or processes.

use crate::dag::{Plan, RunState, Scheduler};
use crate::engine::event_handlers::{CoreStep, handle_invocation_completion, handle_start};
use crate::engine::{InvocationId, RunOutcome, RuntimeEvent};

/// Pure core runtime state.
///
/// It owns the scheduler for a single plan and has no channels, no Tokio
/// types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(plan: &Plan) -> Self {
        Self {
            scheduler: Scheduler::new(plan),
        }
    }

    /// Commands needed to get the run going.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::InvocationCompleted { id, outcome, .. } => {
                handle_invocation_completion(&mut self.scheduler, id, outcome)
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn run_state_of(&self, id: InvocationId) -> Option<RunState> {
        self.scheduler.run_state_of(id)
    }

    /// Aggregate result so far.
    pub fn outcome(&self) -> RunOutcome {
        match self.scheduler.failure() {
            Some((task, failure)) => RunOutcome::Failed {
                task: task.clone(),
                failure: failure.clone(),
            },
            None if self.scheduler.is_finished() => RunOutcome::Succeeded,
            None => RunOutcome::InProgress,
        }
    }
}
