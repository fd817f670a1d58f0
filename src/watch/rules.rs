// src/watch/rules.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::engine::TaskName;

/// What a watch rule does when it fires.
///
/// ```toml
/// reaction = { run = "transpile-dev" }
/// reaction = "reload"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchReaction {
    /// Run a task (with its prerequisites) through the sequencer.
    Run(TaskName),
    /// Ask the live-reload proxy to refresh connected browsers.
    Reload,
}

impl fmt::Display for WatchReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchReaction::Run(task) => write!(f, "run {task}"),
            WatchReaction::Reload => write!(f, "reload"),
        }
    }
}

/// A set of globs, relative to the project root, bound to a reaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WatchRuleSpec {
    pub patterns: Vec<String>,
    pub reaction: WatchReaction,
}

/// Compiled form of a [`WatchRuleSpec`].
#[derive(Clone)]
pub struct WatchRule {
    patterns: GlobSet,
    reaction: WatchReaction,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("reaction", &self.reaction)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn reaction(&self) -> &WatchReaction {
        &self.reaction
    }

    /// Whether a root-relative path such as `"_sass/_main.scss"` matches.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.patterns.is_match(rel_path)
    }
}

/// Compile every rule. `*` never crosses a `/`, so `_sass/*.scss` does not
/// match `_sass/bootstrap/_grid.scss`.
pub fn compile_rules(specs: &[WatchRuleSpec]) -> Result<Vec<WatchRule>> {
    specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let patterns = build_globset(&spec.patterns)
                .with_context(|| format!("building globset for watch rule #{idx}"))?;
            Ok(WatchRule {
                patterns,
                reaction: spec.reaction.clone(),
            })
        })
        .collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Indices of the rules that fire for one change batch.
///
/// A rule appears at most once however many of its files changed.
pub fn rules_fired(rules: &[WatchRule], rel_paths: &[String]) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rel_paths.iter().any(|p| rule.matches(p)))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(patterns: &[&str], reaction: WatchReaction) -> WatchRuleSpec {
        WatchRuleSpec {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            reaction,
        }
    }

    fn dev_rules() -> Vec<WatchRule> {
        compile_rules(&[
            rule(&["_sass/*.scss"], WatchReaction::Run("transpile-dev".into())),
            rule(
                &["*.md", "*.html", "_layouts/*.*", "_includes/*.*", "_posts/*.*", "tags/*.*"],
                WatchReaction::Run("jekyll-build-dev".into()),
            ),
            rule(&["_site/**/*.*"], WatchReaction::Reload),
        ])
        .unwrap()
    }

    fn paths(ps: &[&str]) -> Vec<String> {
        ps.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn sass_change_fires_only_the_styles_rule_once() {
        let rules = dev_rules();
        let fired = rules_fired(&rules, &paths(&["_sass/_main.scss", "_sass/_post.scss"]));
        assert_eq!(fired, vec![0]);
    }

    #[test]
    fn star_does_not_cross_directories() {
        let rules = dev_rules();
        assert!(rules_fired(&rules, &paths(&["_sass/bootstrap/_grid.scss"])).is_empty());
        assert!(rules_fired(&rules, &paths(&["_posts/drafts/x.md"])).is_empty());
    }

    #[test]
    fn site_output_fires_reload() {
        let rules = dev_rules();
        let fired = rules_fired(&rules, &paths(&["_site/css/main.css", "index.html"]));
        assert_eq!(fired, vec![1, 2]);
        assert_eq!(rules[2].reaction(), &WatchReaction::Reload);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let err = compile_rules(&[rule(&["_sass/[.scss"], WatchReaction::Reload)]).unwrap_err();
        assert!(format!("{err:#}").contains("invalid glob pattern"));
    }

    #[test]
    fn reaction_deserializes_from_table_or_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            rules: Vec<WatchRuleSpec>,
        }
        let w: Wrapper = toml::from_str(
            r#"
            [[rules]]
            patterns = ["_sass/*.scss"]
            reaction = { run = "transpile-dev" }

            [[rules]]
            patterns = ["_site/**/*.*"]
            reaction = "reload"
            "#,
        )
        .unwrap();
        assert_eq!(w.rules[0].reaction, WatchReaction::Run("transpile-dev".into()));
        assert_eq!(w.rules[1].reaction, WatchReaction::Reload);
    }
}
