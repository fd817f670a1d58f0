// src/exec/invoker.rs

//! Process invoker: run one external command with inherited stdio.
//!
//! Child output goes straight to our terminal; nothing is captured. The only
//! thing reported back is whether the process could be started and how it
//! exited.

use std::collections::BTreeMap;
use std::fmt;
use std::process::Stdio;

use crate::logging::error_style;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tracing::{debug, error};

use crate::context::TaskContext;
use crate::engine::{TaskFailure, TaskOutcome};

/// An external command line plus per-invocation environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandSpec {
    pub cmd: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Merged into the child's environment only.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(cmd: S) -> Self {
        Self {
            cmd: cmd.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// The command line as it will be spawned, placeholders substituted.
    pub fn render(&self, ctx: &TaskContext) -> String {
        std::iter::once(self.cmd.clone())
            .chain(self.args.iter().map(|a| ctx.render_arg(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self, ctx: &TaskContext) -> Command {
        let mut cmd = Command::new(&self.cmd);
        cmd.args(self.args.iter().map(|a| ctx.render_arg(a)))
            .envs(&self.env)
            .current_dir(ctx.root())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        write!(f, "{}", self.cmd)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Run `spec` to completion.
///
/// A spawn error is returned immediately as [`TaskFailure::Spawn`]; a non-zero
/// exit becomes [`TaskFailure::Exit`] carrying the exit code.
pub async fn invoke(spec: &CommandSpec, ctx: &TaskContext) -> TaskOutcome {
    let line = spec.render(ctx);
    debug!(command = %line, env = ?spec.env, "spawning process");

    let mut child = match spec.to_command(ctx).spawn() {
        Ok(child) => child,
        Err(err) => {
            let failure = TaskFailure::Spawn {
                command: line,
                message: err.to_string(),
            };
            error!("{}", error_style(&failure));
            return TaskOutcome::Failed(failure);
        }
    };

    match child.wait().await {
        Ok(status) if status.success() => TaskOutcome::Success,
        Ok(status) => {
            let failure = TaskFailure::Exit {
                command: line,
                code: status.code(),
            };
            error!("{}", error_style(&failure));
            TaskOutcome::Failed(failure)
        }
        Err(err) => {
            let failure = TaskFailure::Io(format!("waiting for `{line}`: {err}"));
            error!("{}", error_style(&failure));
            TaskOutcome::Failed(failure)
        }
    }
}

/// Start `spec` without waiting for it.
///
/// The returned child is killed when dropped, so whoever owns it controls the
/// process lifetime.
pub fn spawn_owned(spec: &CommandSpec, ctx: &TaskContext) -> Result<Child, TaskFailure> {
    let line = spec.render(ctx);
    debug!(command = %line, "spawning long-lived process");
    spec.to_command(ctx)
        .spawn()
        .map_err(|err| TaskFailure::Spawn {
            command: line,
            message: err.to_string(),
        })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn ctx() -> TaskContext {
        TaskContext::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let outcome = invoke(&CommandSpec::new("true"), &ctx()).await;
        assert_eq!(outcome, TaskOutcome::Success);
    }

    #[tokio::test]
    async fn non_zero_exit_carries_the_code() {
        let spec = CommandSpec::new("sh").arg("-c").arg("exit 3");
        match invoke(&spec, &ctx()).await {
            TaskOutcome::Failed(TaskFailure::Exit { code, command }) => {
                assert_eq!(code, Some(3));
                assert_eq!(command, "sh -c exit 3");
            }
            other => panic!("expected exit failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_failure() {
        let spec = CommandSpec::new("sitepipe-definitely-not-installed");
        let outcome = invoke(&spec, &ctx()).await;
        assert!(matches!(
            outcome,
            TaskOutcome::Failed(TaskFailure::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn env_overrides_reach_the_child_only() {
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("test \"$JEKYLL_ENV\" = production")
            .env("JEKYLL_ENV", "production");
        assert_eq!(invoke(&spec, &ctx()).await, TaskOutcome::Success);
        assert!(std::env::var("JEKYLL_ENV").is_err());
    }

    #[test]
    fn display_shows_env_then_command_line() {
        let spec = CommandSpec::new("bundle")
            .arg("exec")
            .arg("jekyll")
            .env("JEKYLL_ENV", "production");
        assert_eq!(spec.to_string(), "JEKYLL_ENV=production bundle exec jekyll");
    }
}
