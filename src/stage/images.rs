// src/stage/images.rs

//! Image recompression.
//!
//! PNG and JPEG sources are decoded and re-encoded; anything else (GIF, SVG,
//! ICO, ...) passes through untouched. Combined with the stage-level content
//! cache this mirrors a compress-once policy: unchanged sources are never
//! re-encoded.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use tracing::debug;

use crate::stage::artifact::Artifact;
use crate::stage::transform::{Transform, TransformOutcome};

const JPEG_QUALITY: u8 = 80;

pub struct ImageOptimize;

impl Transform for ImageOptimize {
    fn name(&self) -> &str {
        "image-optimize"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        let ext = artifact.extension();
        let encoded = match ext.as_deref() {
            Some("png") => reencode_png(&artifact)?,
            Some("jpg") | Some("jpeg") => reencode_jpeg(&artifact)?,
            _ => return Ok(TransformOutcome::Keep(artifact)),
        };

        // Keep the original when re-encoding did not help.
        if encoded.len() >= artifact.contents.len() {
            debug!(file = %artifact.rel_path.display(), "re-encoding did not shrink image; keeping original");
            return Ok(TransformOutcome::Keep(artifact));
        }

        let mut out = artifact;
        out.contents = encoded;
        Ok(TransformOutcome::Keep(out))
    }
}

fn reencode_png(artifact: &Artifact) -> Result<Vec<u8>> {
    let img = image::load_from_memory(&artifact.contents)
        .with_context(|| format!("decoding {}", artifact.rel_path.display()))?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .with_context(|| format!("encoding {}", artifact.rel_path.display()))?;
    Ok(out)
}

fn reencode_jpeg(artifact: &Artifact) -> Result<Vec<u8>> {
    let img = image::load_from_memory(&artifact.contents)
        .with_context(|| format!("decoding {}", artifact.rel_path.display()))?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    img.write_with_encoder(encoder)
        .with_context(|| format!("encoding {}", artifact.rel_path.display()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_image_extensions_pass_through() {
        let artifact = Artifact::new("images/icon.svg", b"<svg/>".to_vec());
        match ImageOptimize.apply(artifact.clone()).unwrap() {
            TransformOutcome::Keep(out) => assert_eq!(out, artifact),
            other => panic!("expected Keep, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_png_is_a_per_file_error() {
        let artifact = Artifact::new("images/broken.png", b"not a png".to_vec());
        assert!(ImageOptimize.apply(artifact).is_err());
    }
}
