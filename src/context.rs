// src/context.rs

//! Per-process configuration handed to every task invocation.
//!
//! Everything a task needs from "the outside" comes through here instead of
//! through globals: the project root, the address the dev server binds to,
//! the filesystem, and the slot holding the live-reload proxy once the serve
//! task has started it.

use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::fs::{FileSystem, RealFileSystem};
use crate::serve::LiveReloadSlot;
use crate::types::TriggerWhileRunningBehaviour;

/// Placeholder in command arguments replaced by the resolved bind address.
pub const BIND_ADDRESS_PLACEHOLDER: &str = "{bind_address}";

/// Watcher settings from `[config]`.
#[derive(Debug, Clone, Copy)]
pub struct WatchSettings {
    pub debounce: Duration,
    pub behaviour: TriggerWhileRunningBehaviour,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            behaviour: TriggerWhileRunningBehaviour::Queue,
        }
    }
}

pub struct TaskContext {
    root: PathBuf,
    bind_address: Ipv4Addr,
    fs: Arc<dyn FileSystem>,
    live_reload: LiveReloadSlot,
    watch: WatchSettings,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("root", &self.root)
            .field("bind_address", &self.bind_address)
            .field("watch", &self.watch)
            .finish_non_exhaustive()
    }
}

impl TaskContext {
    /// Context rooted at `root`, using the real filesystem and binding to
    /// `0.0.0.0` until told otherwise.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bind_address: Ipv4Addr::UNSPECIFIED,
            fs: Arc::new(RealFileSystem),
            live_reload: LiveReloadSlot::default(),
            watch: WatchSettings::default(),
        }
    }

    pub fn with_bind_address(mut self, addr: Ipv4Addr) -> Self {
        self.bind_address = addr;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_watch_settings(mut self, watch: WatchSettings) -> Self {
        self.watch = watch;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bind_address(&self) -> Ipv4Addr {
        self.bind_address
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn live_reload(&self) -> &LiveReloadSlot {
        &self.live_reload
    }

    pub fn watch_settings(&self) -> WatchSettings {
        self.watch
    }

    /// Resolve a project-relative path against the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Substitute placeholders in a single command argument.
    pub fn render_arg(&self, arg: &str) -> String {
        if arg.contains(BIND_ADDRESS_PLACEHOLDER) {
            arg.replace(BIND_ADDRESS_PLACEHOLDER, &self.bind_address.to_string())
        } else {
            arg.to_string()
        }
    }
}
