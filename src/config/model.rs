// src/config/model.rs

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::Deserialize;

use crate::registry::TaskAction;
use crate::types::TriggerWhileRunningBehaviour;

/// Raw configuration as read from `Sitepipe.toml`, before validation.
///
/// ```toml
/// [config]
/// default_task = "default"
///
/// [task.jekyll-build-dev]
/// action = "command"
/// cmd = "bundle"
/// args = ["exec", "jekyll", "build", "--config", "./_config.yml,./_config-dev.yml"]
///
/// [task.dev]
/// action = "sequence"
/// steps = ["jekyll-build-dev", "transpile-dev", ["jekyll-watch", "jekyll-serve"]]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (see `config::validate`), so holders can rely on every cross-reference
/// resolving and on the task graph being acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { config, task }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Task run when the CLI is given no task name.
    #[serde(default = "default_task_name")]
    pub default_task: String,

    /// Window in which filesystem events are batched into one watch trigger.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Fixed address for `{bind_address}`; when absent the host's first
    /// external IPv4 address is used.
    #[serde(default)]
    pub bind_address: Option<Ipv4Addr>,
}

fn default_task_name() -> String {
    "default".to_string()
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            default_task: default_task_name(),
            debounce_ms: default_debounce_ms(),
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            bind_address: None,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// One-line summary shown by `--list`.
    #[serde(default)]
    pub description: Option<String>,

    /// Prerequisites: run in this order before the task's own action, every
    /// time the task runs.
    #[serde(default)]
    pub after: Vec<String>,

    /// The `action = "..."` key plus its payload.
    #[serde(flatten)]
    pub action: TaskAction,
}
