// src/engine/mod.rs

//! Sequencing engine.
//!
//! This module ties together:
//! - the invocation scheduler (which planned invocations may start now)
//! - the runtime event loop that reacts to invocation completions
//! - the [`Sequencer`] entry point used by the CLI and by watch reactions
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Identifier of one planned invocation inside a [`crate::dag::Plan`].
pub type InvocationId = usize;

/// Why an invocation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The executable could not be launched at all.
    Spawn { command: String, message: String },
    /// The process ran and exited unsuccessfully. `code` is `None` when it was
    /// terminated by a signal.
    Exit { command: String, code: Option<i32> },
    /// A filesystem step (clean, copy, publish) failed.
    Io(String),
    /// The task could not be set up (bad glob, watcher failed to start).
    Setup(String),
}

impl TaskFailure {
    /// Exit code the CLI should use when this failure ends the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskFailure::Exit {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Spawn { command, message } => {
                write!(f, "could not start `{command}`: {message}")
            }
            TaskFailure::Exit {
                command,
                code: Some(code),
            } => write!(f, "`{command}` exited with code {code}"),
            TaskFailure::Exit {
                command,
                code: None,
            } => write!(f, "`{command}` was terminated by a signal"),
            TaskFailure::Io(msg) => write!(f, "{msg}"),
            TaskFailure::Setup(msg) => write!(f, "{msg}"),
        }
    }
}

/// Outcome of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Events flowing into the runtime from the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// An invocation finished with a concrete outcome.
    InvocationCompleted {
        id: InvocationId,
        task: TaskName,
        outcome: TaskOutcome,
    },
}

/// Final state of one sequence run, as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Still waiting on invocations.
    InProgress,
    /// Every invocation succeeded.
    Succeeded,
    /// The first failure, which aborted the rest of the plan.
    Failed { task: TaskName, failure: TaskFailure },
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod sequencer;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use sequencer::Sequencer;
