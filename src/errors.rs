// src/errors.rs

//! Crate-wide error type and exit-code mapping.

use thiserror::Error;

use crate::engine::TaskFailure;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task registered twice: {0}")]
    DuplicateTask(String),

    #[error("Dependency cycle: {0}")]
    DependencyCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("task '{task}' failed: {failure}")]
    TaskFailed { task: String, failure: TaskFailure },

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitepipeError {
    /// Process exit code for this error.
    ///
    /// A failing subprocess hands its own exit code through; everything else
    /// is a plain `1`, except Ctrl-C which follows the shell's `128 + SIGINT`.
    pub fn exit_code(&self) -> i32 {
        match self {
            SitepipeError::TaskFailed { failure, .. } => failure.exit_code(),
            SitepipeError::Interrupted => 130,
            _ => 1,
        }
    }

    /// [`Self::exit_code`] as a process status byte. Codes outside `1..=255`
    /// become `1`.
    pub fn exit_status(&self) -> u8 {
        match u8::try_from(self.exit_code()) {
            Ok(0) | Err(_) => 1,
            Ok(code) => code,
        }
    }

    /// True for errors that are detected before anything runs.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SitepipeError::ConfigError(_)
                | SitepipeError::TaskNotFound(_)
                | SitepipeError::DuplicateTask(_)
                | SitepipeError::DependencyCycle(_)
                | SitepipeError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(code: i32) -> SitepipeError {
        SitepipeError::TaskFailed {
            task: "jekyll-build-release".to_string(),
            failure: TaskFailure::Exit {
                command: "bundle exec jekyll build".to_string(),
                code: Some(code),
            },
        }
    }

    #[test]
    fn exit_status_passes_the_child_code_through() {
        assert_eq!(exited(3).exit_status(), 3);
        assert_eq!(SitepipeError::Interrupted.exit_status(), 130);
        assert_eq!(SitepipeError::TaskNotFound("x".into()).exit_status(), 1);
    }

    #[test]
    fn exit_status_never_reports_success_for_an_error() {
        assert_eq!(exited(256).exit_status(), 1);
        assert_eq!(exited(-1).exit_status(), 1);
    }
}
