// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod deps;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod net;
pub mod registry;
pub mod serve;
pub mod transform;
pub mod types;
pub mod watch;

use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::ConfigFile;
use crate::context::{TaskContext, WatchSettings};
use crate::dag::{Plan, Sequence};
use crate::engine::Sequencer;
use crate::errors::{Result, SitepipeError};
use crate::registry::Registry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the task registry
/// - bind address resolution
/// - the sequencer
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let registry = Arc::new(Registry::from_config(&cfg)?);

    if args.list {
        write_task_list(&mut std::io::stdout().lock(), &registry)?;
        return Ok(());
    }

    let sequence = requested_sequence(args.task.as_deref(), &cfg);
    let bind_address = resolve_bind_address(cfg.config.bind_address, net::get_bind_address);
    let ctx = build_context(&cfg, &config_path, bind_address);
    let sequencer = Sequencer::new(registry, Arc::new(ctx));

    if args.dry_run {
        let plan = sequencer.plan(&sequence)?;
        write_dry_run(
            &mut std::io::stdout().lock(),
            &sequence,
            sequencer.context(),
            &plan,
        )?;
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    tokio::select! {
        result = sequencer.run(&sequence) => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted; stopping");
            stop_live_reload(sequencer.context()).await;
            Err(SitepipeError::Interrupted)
        }
    }
}

/// The task named on the command line, else `[config].default_task`.
fn requested_sequence(task: Option<&str>, cfg: &ConfigFile) -> Sequence {
    Sequence::single(task.unwrap_or(&cfg.config.default_task))
}

/// Configured override, else whatever `detect` finds on this host.
fn resolve_bind_address(
    configured: Option<Ipv4Addr>,
    detect: impl FnOnce() -> Ipv4Addr,
) -> Ipv4Addr {
    match configured {
        Some(addr) => {
            info!(%addr, "using configured bind address");
            addr
        }
        None => {
            let addr = detect();
            info!(%addr, "resolved bind address");
            addr
        }
    }
}

/// Kill the live-reload proxy now rather than leaving it to runtime teardown.
async fn stop_live_reload(ctx: &TaskContext) {
    if let Some(handle) = ctx.live_reload().take().await {
        handle.shutdown().await;
    }
}

fn build_context(cfg: &ConfigFile, config_path: &Path, bind_address: Ipv4Addr) -> TaskContext {
    TaskContext::new(config_root_dir(config_path))
        .with_bind_address(bind_address)
        .with_watch_settings(WatchSettings {
            debounce: Duration::from_millis(cfg.config.debounce_ms),
            behaviour: cfg.config.triggered_while_running_behaviour,
        })
}

/// Project root: the config file's directory, or the working directory for
/// a bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn write_dry_run(
    out: &mut impl Write,
    sequence: &Sequence,
    ctx: &TaskContext,
    plan: &Plan,
) -> Result<()> {
    writeln!(out, "sitepipe dry-run: {sequence}")?;
    writeln!(out, "  root = {}", ctx.root().display())?;
    writeln!(out, "  bind_address = {}", ctx.bind_address())?;
    writeln!(out)?;
    write!(out, "{plan}")?;
    Ok(())
}

fn write_task_list(out: &mut impl Write, registry: &Registry) -> Result<()> {
    writeln!(out, "tasks ({}):", registry.len())?;
    for task in registry.tasks() {
        writeln!(out, "  - {:<24} {}", task.name, task.action.kind())?;
        if let Some(desc) = &task.description {
            writeln!(out, "      {desc}")?;
        }
        if !task.prerequisites.is_empty() {
            writeln!(out, "      after: {}", task.prerequisites.join(", "))?;
        }
    }
    Ok(())
}
