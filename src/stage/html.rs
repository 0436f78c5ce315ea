// src/stage/html.rs

//! Markup transforms for the production bundle.
//!
//! [`BuildBlocks`] is the concatenation pass: marked regions in a page are
//! replaced by a single reference, and the referenced sources are merged,
//! minified and emitted as extra artifacts next to the rewritten page.
//!
//! ```html
//! <!-- build:js js/main.min.js -->
//! <script src="/scripts/a.js"></script>
//! <script src="/scripts/b.js"></script>
//! <!-- endbuild -->
//! ```
//!
//! becomes `<script src="js/main.min.js"></script>` plus a minified
//! `js/main.min.js` artifact.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::stage::artifact::Artifact;
use crate::stage::minify::{minify_js, process_css};
use crate::stage::transform::{Transform, TransformOutcome};

pub struct BuildBlocks {
    /// Roots referenced sources are resolved against, in order (staging
    /// first, then the source tree).
    search_roots: Vec<PathBuf>,
    block_re: Regex,
    ref_re: Regex,
}

impl BuildBlocks {
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self {
            search_roots,
            block_re: Regex::new(
                r"(?s)<!--\s*build:(js|css)\s+(\S+)\s*-->(.*?)<!--\s*endbuild\s*-->",
            )
            .expect("static regex"),
            ref_re: Regex::new(r#"(?:src|href)\s*=\s*["']([^"']+)["']"#).expect("static regex"),
        }
    }

    fn resolve_source(&self, reference: &str) -> Result<Vec<u8>> {
        let rel = reference.trim_start_matches('/');
        for root in &self.search_roots {
            let candidate = root.join(rel);
            if candidate.is_file() {
                return fs::read(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()));
            }
        }
        Err(anyhow!("build-block reference '{reference}' not found"))
    }

    fn bundle(&self, kind: &str, body: &str) -> Result<Vec<u8>> {
        let mut merged = String::new();
        for cap in self.ref_re.captures_iter(body) {
            let source = self.resolve_source(&cap[1])?;
            merged.push_str(std::str::from_utf8(&source).map_err(|_| {
                anyhow!("build-block reference '{}' is not valid UTF-8", &cap[1])
            })?);
            merged.push('\n');
        }

        let minified = match kind {
            "js" => minify_js(&merged)?,
            "css" => process_css(&merged, true)?,
            other => return Err(anyhow!("unknown build-block kind '{other}'")),
        };
        Ok(minified.into_bytes())
    }
}

impl Transform for BuildBlocks {
    fn name(&self) -> &str {
        "build-blocks"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        if artifact.extension().as_deref() != Some("html") {
            return Ok(TransformOutcome::Keep(artifact));
        }

        let text = artifact.text()?.to_string();
        let mut bundles: Vec<Artifact> = Vec::new();
        let mut failure: Option<anyhow::Error> = None;

        let rewritten = self
            .block_re
            .replace_all(&text, |cap: &regex::Captures<'_>| {
                let kind = &cap[1];
                let dest = cap[2].to_string();
                match self.bundle(kind, &cap[3]) {
                    Ok(contents) => {
                        bundles.push(Artifact::new(dest.clone(), contents));
                        match kind {
                            "js" => format!(r#"<script src="{dest}"></script>"#),
                            _ => format!(r#"<link rel="stylesheet" href="{dest}">"#),
                        }
                    }
                    Err(err) => {
                        if failure.is_none() {
                            failure = Some(err);
                        }
                        cap[0].to_string()
                    }
                }
            })
            .into_owned();

        if let Some(err) = failure {
            return Err(err);
        }

        let mut page = artifact;
        page.contents = rewritten.into_bytes();

        let mut out = vec![page];
        out.append(&mut bundles);
        Ok(TransformOutcome::Expand(out))
    }
}

/// Strips comments and collapses inter-tag whitespace. `<pre>` content is
/// not special-cased.
pub struct HtmlMinify {
    comment_re: Regex,
    between_tags_re: Regex,
    runs_re: Regex,
}

impl HtmlMinify {
    pub fn new() -> Self {
        Self {
            comment_re: Regex::new(r"(?s)<!--.*?-->").expect("static regex"),
            between_tags_re: Regex::new(r">\s+<").expect("static regex"),
            runs_re: Regex::new(r"[ \t]*\n\s*").expect("static regex"),
        }
    }
}

impl Default for HtmlMinify {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for HtmlMinify {
    fn name(&self) -> &str {
        "html-minify"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        if artifact.extension().as_deref() != Some("html") {
            return Ok(TransformOutcome::Keep(artifact));
        }

        let text = artifact.text()?.to_string();
        let stripped = self.comment_re.replace_all(&text, "");
        let collapsed = self.runs_re.replace_all(&stripped, " ");
        let tight = self.between_tags_re.replace_all(&collapsed, "><");

        let mut out = artifact;
        out.contents = tight.trim().as_bytes().to_vec();
        Ok(TransformOutcome::Keep(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_collapses_whitespace_and_comments() {
        let html = "<html>\n  <!-- note -->\n  <body>\n    <p>hi</p>\n  </body>\n</html>\n";
        let minify = HtmlMinify::new();
        let out = match minify.apply(Artifact::new("index.html", html.into())).unwrap() {
            TransformOutcome::Keep(a) => a,
            other => panic!("expected Keep, got {other:?}"),
        };
        let text = String::from_utf8(out.contents).unwrap();
        assert_eq!(text, "<html><body><p>hi</p></body></html>");
    }

    #[test]
    fn non_html_passes_through() {
        let minify = HtmlMinify::new();
        let artifact = Artifact::new("notes.txt", b"a  b".to_vec());
        match minify.apply(artifact.clone()).unwrap() {
            TransformOutcome::Keep(out) => assert_eq!(out, artifact),
            other => panic!("expected Keep, got {other:?}"),
        }
    }
}
