// src/registry.rs

//! Task registry: task name → action + prerequisites.
//!
//! Tasks are registered once at startup (normally from `Sitepipe.toml`) and
//! then resolved by name whenever a sequence is planned.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::dag::plan::Sequence;
use crate::deps::CopyDepsSpec;
use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};
use crate::exec::invoker::CommandSpec;
use crate::serve::ServeSpec;
use crate::transform::TransformSpec;
use crate::watch::WatchSpec;

/// What a task does when it runs.
///
/// In TOML the variant is selected by the `action` key of a `[task.<name>]`
/// table; the remaining keys are the variant's payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum TaskAction {
    /// Run one external command.
    Command(CommandSpec),
    /// Remove files or directories below the project root.
    Clean { paths: Vec<std::path::PathBuf> },
    /// Copy files out of the dependency store.
    CopyDeps(CopyDepsSpec),
    /// Run transform commands and publish their output file.
    Transform(TransformSpec),
    /// Run the dev/release web server, optionally behind a live-reload proxy.
    Serve(ServeSpec),
    /// Watch the project and react to changes until the process exits.
    Watch(WatchSpec),
    /// Run other tasks as a sequence.
    Sequence(Sequence),
}

impl TaskAction {
    /// Short kind label, matching the TOML `action` value.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskAction::Command(_) => "command",
            TaskAction::Clean { .. } => "clean",
            TaskAction::CopyDeps(_) => "copy-deps",
            TaskAction::Transform(_) => "transform",
            TaskAction::Serve(_) => "serve",
            TaskAction::Watch(_) => "watch",
            TaskAction::Sequence(_) => "sequence",
        }
    }
}

/// A registered task.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    pub action: TaskAction,
    /// Tasks run, in order, before this task's own action.
    pub prerequisites: Vec<TaskName>,
    pub description: Option<String>,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.action.kind())
    }
}

/// Name-keyed collection of tasks.
#[derive(Debug, Default)]
pub struct Registry {
    tasks: BTreeMap<TaskName, Arc<Task>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a validated config file.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = Self::new();
        for (name, task) in cfg.task.iter() {
            registry.register_task(Task {
                name: name.clone(),
                action: task.action.clone(),
                prerequisites: task.after.clone(),
                description: task.description.clone(),
            })?;
        }
        Ok(registry)
    }

    /// Add a task. Registering the same name twice is a configuration error.
    pub fn register<N: Into<TaskName>>(
        &mut self,
        name: N,
        action: TaskAction,
        prerequisites: Vec<TaskName>,
    ) -> Result<()> {
        self.register_task(Task {
            name: name.into(),
            action,
            prerequisites,
            description: None,
        })
    }

    pub fn register_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(SitepipeError::DuplicateTask(task.name));
        }
        debug!(task = %task.name, kind = task.action.kind(), "registered task");
        self.tasks.insert(task.name.clone(), Arc::new(task));
        Ok(())
    }

    /// Look a task up by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<Task>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| SitepipeError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
