// src/stage/transform.rs

//! The transform seam every stage is built from.

use anyhow::Result;

use crate::stage::artifact::Artifact;

/// What a transform did with one artifact.
#[derive(Debug)]
pub enum TransformOutcome {
    /// Pass the (possibly rewritten) artifact to the next transform.
    Keep(Artifact),
    /// Replace the artifact with several outputs (e.g. a rewritten page plus
    /// the bundles it references).
    Expand(Vec<Artifact>),
    /// Remove the artifact from the stream without error.
    Drop,
}

/// One step in a stage's transform chain.
///
/// Transforms are applied per artifact, in declared order. An `Err` is a
/// per-file failure: the stage runner logs it and drops that artifact, and
/// sibling files are unaffected.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome>;
}

/// Drops style partials (files whose stem starts with `_`); the style
/// compiler pulls them in through imports instead.
pub struct DropPartials;

impl Transform for DropPartials {
    fn name(&self) -> &str {
        "drop-partials"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        let is_partial = artifact
            .rel_path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.starts_with('_'));

        if is_partial {
            Ok(TransformOutcome::Drop)
        } else {
            Ok(TransformOutcome::Keep(artifact))
        }
    }
}
