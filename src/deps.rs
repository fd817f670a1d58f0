// src/deps.rs

//! Dependency copier: copy globbed files out of the dependency store
//! (`node_modules`) into the site's source tree.
//!
//! Each mapping entry is independent. A failing entry is logged and counted
//! but never stops the others.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use crate::logging::error_style;
use globset::{GlobBuilder, GlobMatcher};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::fs::hash::same_content;
use crate::fs::{FileSystem, collect_files};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// One `glob → destination directory` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependencyEntry {
    /// Glob relative to the store, e.g. `jquery/dist/jquery*.{js,map}`.
    pub from: String,
    /// Destination directory relative to the project root.
    pub to: PathBuf,
}

/// Payload of a `copy-deps` task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CopyDepsSpec {
    #[serde(default = "default_store")]
    pub store: PathBuf,
    pub mapping: Vec<DependencyEntry>,
}

fn default_store() -> PathBuf {
    PathBuf::from("node_modules")
}

/// Totals over all entries of one copy step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: usize,
    /// Destination already held identical content; left untouched.
    pub unchanged: usize,
    /// Entries that failed (not files).
    pub failed: usize,
}

/// The literal directory prefix of a glob: every component before the first
/// one containing a glob metacharacter. For a glob without metacharacters
/// this is the parent directory of the named file.
pub fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let literal = components
        .iter()
        .position(|c| c.contains(GLOB_META))
        .unwrap_or(components.len().saturating_sub(1));
    components[..literal].iter().collect()
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Apply every entry of `spec`, resolving the store and destinations against
/// `root`.
pub fn copy_dependencies(fs: &dyn FileSystem, root: &Path, spec: &CopyDepsSpec) -> CopyReport {
    let store = root.join(&spec.store);
    let mut report = CopyReport::default();

    for entry in &spec.mapping {
        match copy_entry(fs, &store, &root.join(&entry.to), entry, &mut report) {
            Ok(n) => info!(from = %entry.from, to = %entry.to.display(), files = n, "copied dependency"),
            Err(err) => {
                report.failed += 1;
                error!(
                    "{}",
                    error_style(format!("copying {} failed: {err:#}", entry.from))
                );
            }
        }
    }

    report
}

/// Copy one entry. Returns the number of matched files.
fn copy_entry(
    fs: &dyn FileSystem,
    store: &Path,
    dest: &Path,
    entry: &DependencyEntry,
    report: &mut CopyReport,
) -> Result<usize> {
    let matcher = compile(&entry.from)?;
    let base = glob_base(&entry.from);
    let base_dir = store.join(&base);

    if !fs.is_dir(&base_dir) {
        bail!("missing dependency directory {}", base_dir.display());
    }

    let mut matched = 0;
    for file in collect_files(fs, &base_dir)? {
        let Ok(in_store) = file.strip_prefix(store) else {
            continue;
        };
        let in_store = in_store.to_string_lossy().replace('\\', "/");
        if !matcher.is_match(&in_store) {
            continue;
        }
        matched += 1;

        let rel = file.strip_prefix(&base_dir).unwrap_or(&file);
        let target = dest.join(rel);

        if same_content(fs, &file, &target) {
            debug!(file = %target.display(), "unchanged");
            report.unchanged += 1;
            continue;
        }

        fs.copy(&file, &target)?;
        debug!(from = %file.display(), to = %target.display(), "copied");
        report.copied += 1;
    }

    if matched == 0 {
        bail!("no files in {} match", store.display());
    }
    Ok(matched)
}
