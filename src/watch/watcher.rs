// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Keeps the debounced watcher alive. Dropping it stops watching.
pub struct WatcherHandle {
    _inner: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively.
///
/// Each debounced batch of create/modify/remove events arrives on the
/// returned receiver as one `Vec` of absolute paths.
pub fn spawn_watcher(
    root: &Path,
    debounce: Duration,
) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<Vec<PathBuf>>)> {
    let (tx, rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                let paths: Vec<PathBuf> = events
                    .into_iter()
                    .filter(|de| {
                        matches!(
                            de.event.kind,
                            EventKind::Create(..) | EventKind::Modify(..) | EventKind::Remove(..)
                        )
                    })
                    .flat_map(|de| de.event.paths)
                    .collect();
                if paths.is_empty() {
                    return;
                }
                debug!(count = paths.len(), "debounced change batch");
                if tx.send(paths).is_err() {
                    debug!("watch loop gone; dropping change batch");
                }
            }
            Err(errors) => {
                for err in errors {
                    warn!("file watch error: {err}");
                }
            }
        }
    })
    .context("creating file watcher")?;

    debouncer
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", root.display()))?;

    info!("file watcher started on {:?}", root);
    Ok((WatcherHandle { _inner: debouncer }, rx))
}
