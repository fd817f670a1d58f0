// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, TaskConfig};
use crate::errors::{Result, SitepipeError};
use crate::registry::TaskAction;
use crate::watch::{WatchReaction, compile_rules};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_references(cfg)?;
    validate_payloads(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SitepipeError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.debounce_ms == 0 {
        return Err(SitepipeError::ConfigError(
            "[config].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if !cfg.task.contains_key(&cfg.config.default_task) {
        return Err(SitepipeError::ConfigError(format!(
            "[config].default_task '{}' is not a defined task",
            cfg.config.default_task
        )));
    }

    Ok(())
}

/// Names a task refers to, with the place each reference comes from.
fn references(task: &TaskConfig) -> Vec<(&'static str, &str)> {
    let mut refs: Vec<(&'static str, &str)> =
        task.after.iter().map(|d| ("after", d.as_str())).collect();

    match &task.action {
        TaskAction::Sequence(seq) => {
            refs.extend(seq.task_names().map(|n| ("steps", n.as_str())));
        }
        TaskAction::Watch(watch) => {
            refs.extend(watch.rules.iter().filter_map(|rule| match &rule.reaction {
                WatchReaction::Run(name) => Some(("reaction", name.as_str())),
                WatchReaction::Reload => None,
            }));
        }
        _ => {}
    }

    refs
}

fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for (field, target) in references(task) {
            if !cfg.task.contains_key(target) {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' refers to unknown task '{target}' in `{field}`"
                )));
            }
            if target == name && field != "reaction" {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `{field}`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_payloads(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        match &task.action {
            TaskAction::CopyDeps(spec) => {
                let mut seen = HashSet::new();
                for entry in &spec.mapping {
                    if !seen.insert(entry.from.as_str()) {
                        return Err(SitepipeError::ConfigError(format!(
                            "task '{name}' maps '{}' more than once",
                            entry.from
                        )));
                    }
                }
            }
            TaskAction::Watch(spec) => {
                compile_rules(&spec.rules).map_err(|err| {
                    SitepipeError::ConfigError(format!("task '{name}': {err:#}"))
                })?;
            }
            TaskAction::Command(spec) if spec.cmd.trim().is_empty() => {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' has an empty `cmd`"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let tasks: &BTreeMap<String, TaskConfig> = &cfg.task;

    // Edge direction: referenced -> referencing. For
    //   [task.B]
    //   after = ["A"]
    // we add A -> B. Watch reactions run on their own and are not edges.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in tasks.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in tasks.iter() {
        for (field, dep) in references(task) {
            if field != "reaction" {
                graph.add_edge(dep, name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SitepipeError::DependencyCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
