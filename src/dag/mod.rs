// src/dag/mod.rs

//! Sequence planning and scheduling.
//!
//! - [`plan`] expands a sequence into an invocation graph.
//! - [`graph`] holds the adjacency view of that graph.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   invocations are ready and what to skip after a failure.
//! - [`task_info`] provides per-invocation state and scheduled invocation types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::InvocationGraph;
pub use plan::{Invocation, Plan, Sequence, Step};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{RunState, ScheduledInvocation};
