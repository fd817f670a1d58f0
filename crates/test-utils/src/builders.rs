use std::collections::BTreeMap;
use std::path::PathBuf;

use sitepipe::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use sitepipe::dag::{Sequence, Step};
use sitepipe::exec::CommandSpec;
use sitepipe::registry::{Registry, TaskAction};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn default_task(mut self, name: &str) -> Self {
        self.config.config.default_task = name.to_string();
        self
    }

    /// The raw config, for tests that want to see validation fail.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    /// Validated config. The default task is pointed at the first task when
    /// the builder was not told otherwise and `default` does not exist.
    pub fn build(mut self) -> ConfigFile {
        if !self.config.task.contains_key(&self.config.config.default_task) {
            if let Some(first) = self.config.task.keys().next() {
                self.config.config.default_task = first.clone();
            }
        }
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Shortcut: validated config straight into a registry.
    pub fn build_registry(self) -> Registry {
        Registry::from_config(&self.build()).expect("registry from valid config")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    fn with_action(action: TaskAction) -> Self {
        Self {
            task: TaskConfig {
                description: None,
                after: vec![],
                action,
            },
        }
    }

    /// A `command` task running `cmd` with whitespace-separated arguments.
    pub fn command(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let mut spec = CommandSpec::new(parts.next().unwrap_or_default());
        for arg in parts {
            spec = spec.arg(arg);
        }
        Self::with_action(TaskAction::Command(spec))
    }

    pub fn clean(paths: &[&str]) -> Self {
        Self::with_action(TaskAction::Clean {
            paths: paths.iter().map(PathBuf::from).collect(),
        })
    }

    /// A `sequence` task; each inner slice is one step, a single name
    /// making it sequential and several names a parallel group.
    pub fn sequence(steps: &[&[&str]]) -> Self {
        let steps = steps
            .iter()
            .map(|names| match names {
                [one] => Step::Sequential(one.to_string()),
                many => Step::Parallel(many.iter().map(|n| n.to_string()).collect()),
            })
            .collect();
        Self::with_action(TaskAction::Sequence(Sequence::from_steps(steps)))
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
