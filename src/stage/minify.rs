// src/stage/minify.rs

//! CSS and JS processing for production output.
//!
//! Uses lightningcss for CSS (vendor prefixing against a fixed browser
//! target set, optional minify) and oxc for JavaScript.

use anyhow::{anyhow, Result};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::stage::artifact::Artifact;
use crate::stage::transform::{Transform, TransformOutcome};

/// Browser versions CSS output is prefixed for.
///
/// Versions are encoded as `major << 16` per the lightningcss convention.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(13 << 16),
        ios_saf: Some(13 << 16),
        android: Some(90 << 16),
        ..Browsers::default()
    })
}

/// Rewrite CSS against the browser target set.
///
/// Prefixing happens in the minify pass; the printer only downlevels syntax,
/// so both run with the same targets.
pub fn process_css(source: &str, minify: bool) -> Result<String> {
    let mut stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| anyhow!("CSS parse error: {e}"))?;
    stylesheet
        .minify(MinifyOptions {
            targets: browser_targets(),
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("CSS transform error: {e}"))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("CSS print error: {e}"))?;
    Ok(result.code)
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return Err(anyhow!(
            "JS parse error: {}",
            ret.errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        ));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Transform applying [`process_css`] to `.css` artifacts; other extensions
/// pass through unchanged.
pub struct CssTransform {
    minify: bool,
}

impl CssTransform {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }
}

impl Transform for CssTransform {
    fn name(&self) -> &str {
        "css"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        if artifact.extension().as_deref() != Some("css") {
            return Ok(TransformOutcome::Keep(artifact));
        }

        // The style compiler embeds its map as a trailing comment, which the
        // reprint drops. Detach it first and put it back; minified output
        // loses the map.
        let text = artifact.text()?.to_string();
        let (css, map_comment) = if self.minify {
            (text.as_str(), None)
        } else {
            split_source_map_comment(&text)
        };

        let mut code = process_css(css, self.minify)?;
        let has_map = map_comment.is_some();
        if let Some(comment) = map_comment {
            if !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(comment);
        }

        let mut out = artifact;
        out.contents = code.into_bytes();
        out.source_maps_attached = has_map;
        Ok(TransformOutcome::Keep(out))
    }
}

/// Split a trailing `/*# sourceMappingURL=... */` comment off `css`.
fn split_source_map_comment(css: &str) -> (&str, Option<&str>) {
    let trimmed = css.trim_end();
    if !trimmed.ends_with("*/") {
        return (css, None);
    }
    match trimmed.rfind("/*# sourceMappingURL=") {
        Some(idx) => (&css[..idx], Some(&trimmed[idx..])),
        None => (css, None),
    }
}

/// Transform applying [`minify_js`] to `.js` artifacts; used for production
/// builds only.
pub struct JsMinify;

impl Transform for JsMinify {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        if artifact.extension().as_deref() != Some("js") {
            return Ok(TransformOutcome::Keep(artifact));
        }

        let code = minify_js(artifact.text()?)?;
        let mut out = artifact;
        out.contents = code.into_bytes();
        Ok(TransformOutcome::Keep(out))
    }
}
