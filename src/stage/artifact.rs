// src/stage/artifact.rs

use std::path::{Path, PathBuf};

/// A file flowing through a stage.
///
/// `rel_path` is relative to the stage's strip prefix (usually the category's
/// source directory) and determines where the file lands inside each commit
/// directory. Transforms may rewrite both path and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub rel_path: PathBuf,
    pub contents: Vec<u8>,
    pub source_maps_attached: bool,
}

impl Artifact {
    pub fn new(rel_path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            rel_path: rel_path.into(),
            contents,
            source_maps_attached: false,
        }
    }

    /// Contents as UTF-8 text, for text transforms.
    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|_| anyhow::anyhow!("{} is not valid UTF-8", self.rel_path.display()))
    }

    /// Replace the path's extension, keeping the rest intact.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.rel_path.set_extension(ext);
        self
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.rel_path)
    }
}

pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
