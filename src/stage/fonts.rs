// src/stage/fonts.rs

//! Vendor font copying.
//!
//! Vendor packages ship font files alongside their scripts and styles. The
//! manifest lists every asset; this transform picks out the font-typed ones
//! and feeds them into the font output, flattened to their file names. The
//! manifest is read per run, so a watch-triggered rerun sees fresh entries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;

use crate::inject::Manifest;
use crate::stage::artifact::{extension_of, Artifact};
use crate::stage::transform::{Transform, TransformOutcome};

const FONT_EXTENSIONS: [&str; 5] = ["eot", "svg", "ttf", "woff", "woff2"];

/// Expands the manifest file into one artifact per listed font asset.
///
/// The owning stage's input is the manifest itself. Asset paths resolve
/// relative to the manifest's directory. A listed font that cannot be read
/// is skipped with a warning so the rest still copies.
pub struct VendorFonts {
    manifest_path: PathBuf,
}

impl VendorFonts {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }
}

impl Transform for VendorFonts {
    fn name(&self) -> &str {
        "vendor-fonts"
    }

    fn apply(&self, _manifest_file: Artifact) -> Result<TransformOutcome> {
        let manifest = Manifest::load(&self.manifest_path)?;
        let base = self.manifest_path.parent().unwrap_or_else(|| Path::new(""));

        let mut fonts = Vec::new();
        for asset in manifest.assets() {
            let path = Path::new(asset);
            let is_font =
                extension_of(path).is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.as_str()));
            if !is_font {
                continue;
            }
            let Some(file_name) = path.file_name() else {
                continue;
            };
            match fs::read(base.join(path)) {
                Ok(contents) => fonts.push(Artifact::new(PathBuf::from(file_name), contents)),
                Err(err) => {
                    warn!(asset = %asset, error = %err, "listed font asset unreadable; skipping")
                }
            }
        }

        if fonts.is_empty() {
            Ok(TransformOutcome::Drop)
        } else {
            Ok(TransformOutcome::Expand(fonts))
        }
    }
}
