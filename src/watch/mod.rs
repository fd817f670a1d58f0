// src/watch/mod.rs

//! File watching for the dev loop.
//!
//! This module is responsible for:
//! - compiling each watch rule's globs (`rules`)
//! - wiring up a debounced cross-platform watcher (`watcher`)
//! - turning change batches into reactions, at most one in flight per rule
//!   (`reactions`)

pub mod path_utils;
pub mod reactions;
pub mod rules;
pub mod watcher;

use serde::Deserialize;

pub use reactions::{ReactionGate, run_watch};
pub use rules::{WatchReaction, WatchRule, WatchRuleSpec, compile_rules, rules_fired};
pub use watcher::{WatcherHandle, spawn_watcher};

/// Payload of a `watch` task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchSpec {
    pub rules: Vec<WatchRuleSpec>,
}
