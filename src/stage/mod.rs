// src/stage/mod.rs

//! Stage declaration and execution.
//!
//! A stage is an ordered transform pipeline applied to the set of files
//! matching its input globs. Only the final commit step touches the
//! destination directories; everything before that is per-file and pure from
//! the stream's point of view.

pub mod artifact;
pub mod cache;
pub mod command;
pub mod fonts;
pub mod html;
pub mod images;
pub mod minify;
pub mod runner;
pub mod transform;

use std::fmt;
use std::path::PathBuf;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{PipelineError, Result};
use crate::reload::ReloadScope;

pub use artifact::Artifact;
pub use cache::HashCache;
pub use runner::{run_stage, StageReport};
pub use transform::{DropPartials, Transform, TransformOutcome};

/// One named processing stage.
pub struct Stage {
    name: String,
    /// Directory the input walk starts from; globs are matched against paths
    /// relative to it.
    walk_root: PathBuf,
    /// Prefix stripped from matched paths to form artifact-relative paths.
    strip_prefix: PathBuf,
    input_patterns: Vec<String>,
    input_set: GlobSet,
    exclude_set: Option<GlobSet>,
    transforms: Vec<Box<dyn Transform>>,
    /// Destinations surviving artifacts are written to, in order (staging
    /// first where the category has one).
    commit_dirs: Vec<PathBuf>,
    cache: Option<HashCache>,
    reload: Option<ReloadScope>,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("input", &self.input_patterns)
            .field("commit_dirs", &self.commit_dirs)
            .finish_non_exhaustive()
    }
}

impl Stage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        walk_root: impl Into<PathBuf>,
        strip_prefix: impl Into<PathBuf>,
        input: &[String],
        exclude: &[String],
        transforms: Vec<Box<dyn Transform>>,
        commit_dirs: Vec<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();

        if input.is_empty() || input.iter().any(|g| g.is_empty()) {
            return Err(PipelineError::Config(format!(
                "stage '{name}' needs at least one non-empty input glob"
            )));
        }

        let input_set = build_globset(&name, input)?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(&name, exclude)?)
        };

        Ok(Self {
            name,
            walk_root: walk_root.into(),
            strip_prefix: strip_prefix.into(),
            input_patterns: input.to_vec(),
            input_set,
            exclude_set,
            transforms,
            commit_dirs,
            cache: None,
            reload: None,
        })
    }

    pub fn with_cache(mut self, cache: HashCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_reload(mut self, scope: ReloadScope) -> Self {
        self.reload = Some(scope);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reload(&self) -> Option<ReloadScope> {
        self.reload
    }

    pub fn input_patterns(&self) -> &[String] {
        &self.input_patterns
    }

    /// Whether `rel_path` (relative to the walk root, forward slashes) is an
    /// input of this stage.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.input_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    pub(crate) fn walk_root(&self) -> &PathBuf {
        &self.walk_root
    }

    pub(crate) fn strip_prefix(&self) -> &PathBuf {
        &self.strip_prefix
    }

    pub(crate) fn transforms(&self) -> &[Box<dyn Transform>] {
        &self.transforms
    }

    pub(crate) fn commit_dirs(&self) -> &[PathBuf] {
        &self.commit_dirs
    }

    pub(crate) fn cache(&self) -> Option<&HashCache> {
        self.cache.as_ref()
    }
}

/// `*` must not cross directories: `src/*.*` means top-level files only,
/// while `**` keeps its recursive meaning.
fn build_globset(stage: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                PipelineError::Config(format!("stage '{stage}' has invalid glob '{pat}': {e}"))
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PipelineError::Config(format!("stage '{stage}' globset: {e}")))
}
