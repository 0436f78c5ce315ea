// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! A binding maps a set of source globs to the dispatches a matching change
//! should produce. Dispatch planning is pure so it can be tested without a
//! real watcher; [`watcher`] owns the notify wiring.

pub mod path_utils;
pub mod watcher;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{PipelineError, Result};
use crate::graph::TaskName;
use crate::reload::ReloadScope;

pub use watcher::{spawn_watcher, WatcherHandle};

/// What a matching file change should cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Run a task from the graph.
    Run(TaskName),
    /// Signal browsers directly, without running anything.
    Reload(ReloadScope),
}

/// One watch rule: globs on one side, dispatches on the other.
#[derive(Debug)]
pub struct WatchBinding {
    patterns: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
    dispatches: Vec<Dispatch>,
}

impl WatchBinding {
    pub fn new(patterns: &[String], exclude: &[String], dispatches: Vec<Dispatch>) -> Result<Self> {
        if patterns.is_empty() {
            return Err(PipelineError::Config(
                "watch binding needs at least one glob".to_string(),
            ));
        }
        let include_set = build_globset(patterns)?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };
        Ok(Self {
            patterns: patterns.to_vec(),
            include_set,
            exclude_set,
            dispatches,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `rel_path` (relative to the project root, forward slashes)
    /// falls under this binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// All dispatches a change to `rel_path` should produce, binding order
/// preserved and duplicates removed.
pub fn plan_dispatches(rel_path: &str, bindings: &[WatchBinding]) -> Vec<Dispatch> {
    let mut out: Vec<Dispatch> = Vec::new();
    for binding in bindings {
        if !binding.matches(rel_path) {
            continue;
        }
        for dispatch in &binding.dispatches {
            if !out.contains(dispatch) {
                out.push(dispatch.clone());
            }
        }
    }
    out
}

/// Same separator rules as stage globs: `*` stays inside one path component.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                PipelineError::Config(format!("watch binding has invalid glob '{pat}': {e}"))
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PipelineError::Config(format!("watch binding globset: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(patterns: &[&str], dispatches: Vec<Dispatch>) -> WatchBinding {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        WatchBinding::new(&patterns, &[], dispatches).unwrap()
    }

    #[test]
    fn non_matching_path_plans_nothing() {
        let bindings = vec![binding(
            &["src/scss/**/*.scss"],
            vec![Dispatch::Run("styles".into())],
        )];
        assert!(plan_dispatches("README.md", &bindings).is_empty());
    }

    #[test]
    fn duplicate_dispatches_collapse() {
        let bindings = vec![
            binding(&["src/**/*.scss"], vec![Dispatch::Run("styles".into())]),
            binding(&["src/scss/**"], vec![Dispatch::Run("styles".into())]),
        ];
        assert_eq!(
            plan_dispatches("src/scss/main.scss", &bindings),
            vec![Dispatch::Run("styles".into())]
        );
    }

    #[test]
    fn exclusions_suppress_a_binding() {
        let patterns = vec!["src/*.*".to_string()];
        let exclude = vec!["src/*.html".to_string()];
        let b = WatchBinding::new(&patterns, &exclude, vec![Dispatch::Run("static".into())])
            .unwrap();
        assert!(b.matches("src/favicon.ico"));
        assert!(!b.matches("src/index.html"));
    }
}
