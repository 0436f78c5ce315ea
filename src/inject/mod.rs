// src/inject/mod.rs

//! Dependency injection: rewriting marked regions in markup and style
//! sources with references to vendor assets from the manifest.

pub mod manifest;

use std::path::Path;

use crate::errors::{PipelineError, Result};
use crate::stage::artifact::extension_of;
use crate::stage::{Artifact, Transform, TransformOutcome};

pub use manifest::{Manifest, ManifestEntry};

/// How a vendor asset path becomes a reference line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFormat {
    /// `<script src>` / `<link rel="stylesheet">` tags for markup targets.
    Markup,
    /// `@import '…';` statements for style targets.
    StyleImport,
}

impl RefFormat {
    /// Render one asset reference, or `None` when the asset type is not
    /// representable in this format (fonts in markup, scripts in styles).
    fn render(&self, asset: &str) -> Option<String> {
        let ext = extension_of(Path::new(asset))?;
        match self {
            RefFormat::Markup => match ext.as_str() {
                "js" => Some(format!(r#"<script src="/{asset}"></script>"#)),
                "css" => Some(format!(r#"<link rel="stylesheet" href="/{asset}">"#)),
                _ => None,
            },
            RefFormat::StyleImport => match ext.as_str() {
                "css" | "scss" | "sass" => {
                    Some(format!("@import '{}';", asset.trim_start_matches('/')))
                }
                _ => None,
            },
        }
    }

    /// Marker pair conventionally used with this format.
    fn markers(&self) -> (&'static str, &'static str) {
        match self {
            RefFormat::Markup => ("<!-- inject:vendor -->", "<!-- endinject -->"),
            RefFormat::StyleImport => ("// inject:vendor", "// endinject"),
        }
    }
}

/// Rewrites the region between a start/end marker pair.
#[derive(Debug, Clone)]
pub struct Injector {
    start: String,
    end: String,
    format: RefFormat,
}

impl Injector {
    pub fn new(format: RefFormat) -> Self {
        let (start, end) = format.markers();
        Self {
            start: start.to_string(),
            end: end.to_string(),
            format,
        }
    }

    pub fn with_markers(format: RefFormat, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            format,
        }
    }

    /// Whether `text` opts in to injection at all. A present start marker
    /// with a missing end marker is still "has markers": it is a malformed
    /// region and [`inject`](Self::inject) will report it.
    pub fn has_markers(&self, text: &str) -> bool {
        text.contains(&self.start)
    }

    /// Replace the marked region of `text` with one reference line per
    /// renderable asset, in manifest order. The operation is idempotent:
    /// the region is fully regenerated on every call.
    pub fn inject<'a, I>(&self, file: &Path, text: &str, assets: I) -> Result<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(start_idx) = text.find(&self.start) else {
            return Err(PipelineError::Injection {
                file: file.to_path_buf(),
                marker: self.start.clone(),
            });
        };
        let after_start = start_idx + self.start.len();
        let Some(end_rel) = text[after_start..].find(&self.end) else {
            return Err(PipelineError::Injection {
                file: file.to_path_buf(),
                marker: self.end.clone(),
            });
        };
        let end_idx = after_start + end_rel;

        // Reference lines keep the indentation of the start marker's line.
        let marker_start = after_start - self.start.len();
        let line_start = text[..marker_start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let indent: String = text[line_start..marker_start]
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect();

        let mut block = String::new();
        for asset in assets {
            if let Some(line) = self.format.render(asset) {
                block.push('\n');
                block.push_str(&indent);
                block.push_str(&line);
            }
        }
        block.push('\n');
        block.push_str(&indent);

        Ok(format!(
            "{}{}{}",
            &text[..after_start],
            block,
            &text[end_idx..]
        ))
    }

}

/// Transform wiring the injector into a stage.
///
/// The manifest is re-read on every run, so a manifest edit followed by a
/// watch-triggered inject always sees the current asset list. Files without
/// markers are dropped from the stream (nothing to rewrite, and not
/// rewriting them keeps their mtimes stable under the watcher). Malformed
/// marker pairs are a per-file error.
pub struct InjectRefs {
    injector: Injector,
    manifest_path: std::path::PathBuf,
}

impl InjectRefs {
    pub fn new(format: RefFormat, manifest_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            injector: Injector::new(format),
            manifest_path: manifest_path.into(),
        }
    }
}

impl Transform for InjectRefs {
    fn name(&self) -> &str {
        "inject-refs"
    }

    fn apply(&self, artifact: Artifact) -> anyhow::Result<TransformOutcome> {
        let text = artifact.text()?;
        if !self.injector.has_markers(text) {
            return Ok(TransformOutcome::Drop);
        }

        let manifest = Manifest::load(&self.manifest_path)?;
        let assets: Vec<String> = manifest.assets().map(str::to_string).collect();
        let rewritten = self.injector.inject(
            &artifact.rel_path,
            text,
            assets.iter().map(String::as_str),
        )?;

        let mut out = artifact;
        out.contents = rewritten.into_bytes();
        Ok(TransformOutcome::Keep(out))
    }
}
