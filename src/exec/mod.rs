// src/exec/mod.rs

//! Execution layer.
//!
//! - [`invoker`] runs one external command with inherited stdio.
//! - [`executor_loop`] owns the background loop that runs dispatched
//!   invocations, one Tokio task each.
//! - [`task_runner`] runs the action of a single invocation.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production; tests replace it with a fake.

pub mod backend;
pub mod executor_loop;
pub mod invoker;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use invoker::{CommandSpec, invoke};
