// src/stage/runner.rs

//! Executes one stage: collect inputs, run the transform chain per file,
//! commit survivors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::stage::artifact::Artifact;
use crate::stage::cache::content_hash;
use crate::stage::transform::TransformOutcome;
use crate::stage::Stage;

/// Outcome of a stage run.
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    /// Number of artifacts written to the commit directories.
    pub committed: usize,
    /// Relative paths of committed artifacts (forward slashes).
    pub files: Vec<String>,
}

/// Run a stage to completion.
///
/// Per-file transform failures are logged and drop only the failing file;
/// the run itself fails only on input-collection or commit IO errors.
/// Output is deterministic for an unchanged source tree, so re-running a
/// stage is idempotent.
pub fn run_stage(stage: &Stage) -> Result<StageReport> {
    let inputs = collect_input_files(stage)?;
    debug!(stage = stage.name(), files = inputs.len(), "stage inputs collected");

    let mut outputs: Vec<Artifact> = Vec::new();
    let mut skipped = 0usize;

    for path in inputs {
        let rel = relative_artifact_path(stage, &path);
        let rel_key = rel.to_string_lossy().replace('\\', "/");

        let contents = match fs::read(&path)
            .with_context(|| format!("reading {}", path.display()))
        {
            Ok(c) => c,
            Err(err) => {
                warn!(stage = stage.name(), file = %rel_key, error = %err, "unreadable input; skipping file");
                continue;
            }
        };

        // Content-hash cache: skip files whose source is unchanged and whose
        // commit targets already exist.
        let hash = stage.cache().map(|_| content_hash(&contents));
        if let (Some(cache), Some(hash)) = (stage.cache(), hash.as_deref()) {
            if cache.is_unchanged(&rel_key, hash) && commit_targets_exist(stage, &rel) {
                debug!(stage = stage.name(), file = %rel_key, "content unchanged; skipping");
                skipped += 1;
                continue;
            }
        }

        let survivors = apply_transforms(stage, Artifact::new(rel, contents));
        if !survivors.is_empty() {
            if let (Some(cache), Some(hash)) = (stage.cache(), hash.as_deref()) {
                cache.record(&rel_key, hash);
            }
        }
        outputs.extend(survivors);
    }

    let mut report = StageReport::default();
    for artifact in &outputs {
        commit_artifact(stage, artifact)?;
        report.committed += 1;
        report
            .files
            .push(artifact.rel_path.to_string_lossy().replace('\\', "/"));
    }
    report.files.sort();

    if let Some(cache) = stage.cache() {
        cache.persist()?;
    }

    info!(
        stage = stage.name(),
        committed = report.committed,
        skipped,
        "stage finished"
    );
    Ok(report)
}

/// Apply the stage's transform chain to one input artifact.
///
/// Errors are per-file: the offending artifact is dropped with a warning and
/// the rest of the stream is unaffected.
fn apply_transforms(stage: &Stage, input: Artifact) -> Vec<Artifact> {
    let mut current = vec![input];

    for transform in stage.transforms() {
        let mut next = Vec::new();
        for artifact in current {
            let file = artifact.rel_path.clone();
            match transform.apply(artifact) {
                Ok(TransformOutcome::Keep(a)) => next.push(a),
                Ok(TransformOutcome::Expand(many)) => next.extend(many),
                Ok(TransformOutcome::Drop) => {}
                Err(err) => {
                    warn!(
                        stage = stage.name(),
                        transform = transform.name(),
                        file = %file.display(),
                        error = %err,
                        "transform failed; dropping file"
                    );
                }
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    current
}

/// Walk the stage's root and return all files matching its globs, sorted.
fn collect_input_files(stage: &Stage) -> Result<Vec<PathBuf>> {
    let root = stage.walk_root();
    let mut files = Vec::new();

    if !root.is_dir() {
        return Ok(files);
    }

    let mut stack = vec![root.clone()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("reading dir {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if stage.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

fn relative_artifact_path(stage: &Stage, path: &Path) -> PathBuf {
    let base = stage.walk_root().join(stage.strip_prefix());
    path.strip_prefix(&base)
        .or_else(|_| path.strip_prefix(stage.walk_root()))
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn commit_targets_exist(stage: &Stage, rel: &Path) -> bool {
    stage
        .commit_dirs()
        .iter()
        .all(|dir| dir.join(rel).is_file())
}

fn commit_artifact(stage: &Stage, artifact: &Artifact) -> Result<()> {
    for dir in stage.commit_dirs() {
        let dest = dir.join(&artifact.rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&dest, &artifact.contents)
            .with_context(|| format!("writing {}", dest.display()))?;
    }
    Ok(())
}
