// src/stage/command.rs

//! Transforms that shell out to an external processor.
//!
//! The style compiler is deliberately treated as an opaque stage: we pipe
//! source through its stdin/stdout and consume whatever it produces. The
//! binary is located with `which` on first use and cached.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::stage::artifact::Artifact;
use crate::stage::transform::{Transform, TransformOutcome};

/// Pipe an artifact's contents through `program args… < stdin > stdout`.
///
/// Stdin is fed from its own thread while this one drains stdout, so a child
/// that emits output before consuming all its input cannot wedge on a full
/// pipe.
fn pipe_through(program: &Path, args: &[String], input: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {}", program.display()))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("no stdin handle for {}", program.display()))?;
    let payload = input.to_vec();
    let writer = std::thread::spawn(move || stdin.write_all(&payload));

    let output = child
        .wait_with_output()
        .with_context(|| format!("waiting for {}", program.display()))?;

    match writer.join() {
        Ok(Ok(())) => {}
        // A child that exits early closes its end; its status tells the story.
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
        Ok(Err(err)) => {
            return Err(anyhow!("writing to {} stdin: {err}", program.display()));
        }
        Err(_) => return Err(anyhow!("stdin writer for {} panicked", program.display())),
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        ));
    }

    Ok(output.stdout)
}

/// Compiles `.scss` / `.sass` sources to CSS via the external `sass` binary.
///
/// Plain `.css` inputs pass through untouched so a project can mix compiled
/// and hand-written styles in the same category.
pub struct StyleCompile {
    compiler: OnceLock<PathBuf>,
    load_path: PathBuf,
}

impl StyleCompile {
    /// `load_path` is the styles source directory, so entry points can import
    /// partials by bare name. The compiler is not looked up until the first
    /// `.scss`/`.sass` file actually needs it.
    pub fn new(load_path: impl Into<PathBuf>) -> Self {
        Self {
            compiler: OnceLock::new(),
            load_path: load_path.into(),
        }
    }

    /// Use an explicit compiler binary (tests, custom installs).
    pub fn with_compiler(compiler: impl Into<PathBuf>, load_path: impl Into<PathBuf>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(compiler.into());
        Self {
            compiler: cell,
            load_path: load_path.into(),
        }
    }

    fn compiler(&self) -> Result<&Path> {
        if let Some(path) = self.compiler.get() {
            return Ok(path);
        }
        let found = which::which("sass").context("style compiler 'sass' not found on PATH")?;
        debug!(compiler = %found.display(), "located style compiler");
        Ok(self.compiler.get_or_init(|| found).as_path())
    }
}

impl Transform for StyleCompile {
    fn name(&self) -> &str {
        "style-compile"
    }

    fn apply(&self, artifact: Artifact) -> Result<TransformOutcome> {
        let ext = artifact.extension();
        let indented_syntax = matches!(ext.as_deref(), Some("sass"));
        if !matches!(ext.as_deref(), Some("scss") | Some("sass")) {
            return Ok(TransformOutcome::Keep(artifact));
        }

        let mut args = vec![
            "--stdin".to_string(),
            "--load-path".to_string(),
            self.load_path.to_string_lossy().into_owned(),
            "--embed-source-map".to_string(),
        ];
        if indented_syntax {
            args.push("--indented".to_string());
        }

        let css = pipe_through(self.compiler()?, &args, &artifact.contents)?;

        let mut out = artifact.with_extension("css");
        out.contents = css;
        out.source_maps_attached = true;
        Ok(TransformOutcome::Keep(out))
    }
}
