// src/serve.rs

//! Serve task: the site server plus an optional live-reload proxy.
//!
//! The proxy is an owned child process. While the server runs, its handle
//! sits in the context's [`LiveReloadSlot`] so watch reactions can ask it to
//! reload connected browsers. When the server exits the handle is taken back
//! and the proxy is stopped.

use std::sync::Arc;

use crate::logging::error_style;
use serde::Deserialize;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::context::TaskContext;
use crate::engine::TaskOutcome;
use crate::exec::invoker::{CommandSpec, invoke, spawn_owned};

/// Payload of a `serve` task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServeSpec {
    /// Runs in the foreground; the task lasts as long as it does.
    pub server: CommandSpec,
    #[serde(default)]
    pub live_reload: Option<LiveReloadSpec>,
}

/// How to start the proxy and how to tell it to reload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveReloadSpec {
    #[serde(flatten)]
    pub proxy: CommandSpec,
    /// Arguments for `cmd` that make the running proxy reload its clients.
    #[serde(default)]
    pub reload_args: Vec<String>,
}

impl LiveReloadSpec {
    pub fn reload_command(&self) -> CommandSpec {
        CommandSpec {
            cmd: self.proxy.cmd.clone(),
            args: self.reload_args.clone(),
            env: self.proxy.env.clone(),
        }
    }
}

/// A running live-reload proxy.
#[derive(Debug)]
pub struct LiveReloadHandle {
    child: Child,
    reload: CommandSpec,
}

impl LiveReloadHandle {
    pub fn new(child: Child, reload: CommandSpec) -> Self {
        Self { child, reload }
    }

    /// Stop the proxy and wait for it to go away.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.child.kill().await {
            debug!("live reload proxy already gone: {err}");
        }
    }
}

/// Shared place for the one live-reload proxy of this process.
#[derive(Debug, Clone, Default)]
pub struct LiveReloadSlot(Arc<Mutex<Option<LiveReloadHandle>>>);

impl LiveReloadSlot {
    /// Store `handle`, stopping any proxy that was there before.
    pub async fn install(&self, handle: LiveReloadHandle) {
        let previous = self.0.lock().await.replace(handle);
        if let Some(old) = previous {
            old.shutdown().await;
        }
    }

    pub async fn take(&self) -> Option<LiveReloadHandle> {
        self.0.lock().await.take()
    }

    pub async fn is_running(&self) -> bool {
        self.0.lock().await.is_some()
    }

    /// Ask the running proxy to reload its browsers. Without a proxy this is
    /// a no-op.
    pub async fn reload(&self, ctx: &TaskContext) -> TaskOutcome {
        let reload = match self.0.lock().await.as_ref() {
            Some(handle) => handle.reload.clone(),
            None => {
                debug!("no live reload proxy running; nothing to reload");
                return TaskOutcome::Success;
            }
        };
        invoke(&reload, ctx).await
    }
}

/// Run the serve task until the server process exits.
pub async fn run_serve(spec: &ServeSpec, ctx: &TaskContext) -> TaskOutcome {
    if let Some(live_reload) = &spec.live_reload {
        match spawn_owned(&live_reload.proxy, ctx) {
            Ok(child) => {
                info!(address = %ctx.bind_address(), "live reload proxy started");
                ctx.live_reload()
                    .install(LiveReloadHandle::new(child, live_reload.reload_command()))
                    .await;
            }
            Err(failure) => {
                error!("{}", error_style(&failure));
                return TaskOutcome::Failed(failure);
            }
        }
    }

    let outcome = invoke(&spec.server, ctx).await;

    if let Some(handle) = ctx.live_reload().take().await {
        info!("stopping live reload proxy");
        handle.shutdown().await;
    }
    outcome
}
