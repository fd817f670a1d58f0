// src/watch/reactions.rs

//! The watch task's event loop.

use std::future::Future;
use std::pin::Pin;

use crate::logging::error_style;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{Sequencer, TaskFailure, TaskOutcome};
use crate::types::TriggerWhileRunningBehaviour;
use crate::watch::WatchSpec;
use crate::watch::path_utils::relative_str;
use crate::watch::rules::{WatchReaction, WatchRule, compile_rules, rules_fired};
use crate::watch::watcher::spawn_watcher;

/// Per-rule bookkeeping so a rule never has two reactions in flight.
#[derive(Debug, Clone)]
pub struct ReactionGate {
    behaviour: TriggerWhileRunningBehaviour,
    running: bool,
    queued: bool,
}

impl ReactionGate {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            running: false,
            queued: false,
        }
    }

    /// Record a trigger. Returns `true` if the reaction should start now.
    pub fn trigger(&mut self) -> bool {
        if !self.running {
            self.running = true;
            return true;
        }
        if self.behaviour == TriggerWhileRunningBehaviour::Queue {
            self.queued = true;
        }
        false
    }

    /// Record that the running reaction finished. Returns `true` if a queued
    /// trigger should start it again right away.
    pub fn finish(&mut self) -> bool {
        if self.queued {
            self.queued = false;
            return true;
        }
        self.running = false;
        false
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Watch the project root until the process exits.
///
/// Reaction failures are reported and watching continues. Only a watcher
/// that cannot start (or dies) ends the task.
pub async fn run_watch(spec: &WatchSpec, sequencer: Sequencer) -> TaskOutcome {
    let ctx = sequencer.context();

    let rules = match compile_rules(&spec.rules) {
        Ok(rules) => rules,
        Err(err) => return setup_failure(format!("{err:#}")),
    };

    let root = ctx.root().canonicalize().unwrap_or_else(|_| ctx.root().to_path_buf());
    let settings = ctx.watch_settings();

    let (_handle, mut batches) = match spawn_watcher(&root, settings.debounce) {
        Ok(pair) => pair,
        Err(err) => return setup_failure(format!("{err:#}")),
    };

    let mut gates: Vec<ReactionGate> = rules
        .iter()
        .map(|_| ReactionGate::new(settings.behaviour))
        .collect();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<usize>();

    info!(rules = rules.len(), "watching for changes");

    loop {
        tokio::select! {
            batch = batches.recv() => {
                let Some(paths) = batch else {
                    return setup_failure("file watcher stopped".to_string());
                };
                let rel: Vec<String> = paths
                    .iter()
                    .filter_map(|p| relative_str(&root, p))
                    .collect();

                for idx in rules_fired(&rules, &rel) {
                    if gates[idx].trigger() {
                        start_reaction(idx, &rules[idx], &sequencer, &done_tx);
                    } else {
                        debug!(rule = idx, reaction = %rules[idx].reaction(), "reaction still running");
                    }
                }
            }
            Some(idx) = done_rx.recv() => {
                if gates[idx].finish() {
                    start_reaction(idx, &rules[idx], &sequencer, &done_tx);
                }
            }
        }
    }
}

fn setup_failure(message: String) -> TaskOutcome {
    let failure = TaskFailure::Setup(message);
    error!("{}", error_style(&failure));
    TaskOutcome::Failed(failure)
}

type ReactionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn start_reaction(
    idx: usize,
    rule: &WatchRule,
    sequencer: &Sequencer,
    done_tx: &mpsc::UnboundedSender<usize>,
) {
    let reaction = rule.reaction().clone();
    let sequencer = sequencer.clone();
    let done_tx = done_tx.clone();
    info!(rule = idx, reaction = %reaction, "change detected");

    let fut: ReactionFuture = Box::pin(async move {
        match &reaction {
            WatchReaction::Run(task) => {
                if let Err(err) = sequencer.run_task(task).await {
                    error!("{}", error_style(format!("reaction `{reaction}` failed: {err}")));
                }
            }
            WatchReaction::Reload => {
                let ctx = sequencer.context();
                if let TaskOutcome::Failed(failure) = ctx.live_reload().reload(ctx).await {
                    error!("{}", error_style(format!("live reload failed: {failure}")));
                }
            }
        }
        let _ = done_tx.send(idx);
    });
    tokio::spawn(fut);
}
