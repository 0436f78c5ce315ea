// tests/stage_runner.rs

//! Stage runner behaviour on real file trees.

use std::fs;

use assetpipe::stage::{run_stage, Artifact, DropPartials, Transform, TransformOutcome};
use assetpipe_test_utils::builders::{write_file, StageBuilder};
use assetpipe_test_utils::init_tracing;

/// Transform that fails for one specific file and keeps everything else.
struct FailOn(&'static str);

impl Transform for FailOn {
    fn name(&self) -> &str {
        "fail-on"
    }

    fn apply(&self, artifact: Artifact) -> anyhow::Result<TransformOutcome> {
        if artifact.rel_path.to_string_lossy() == self.0 {
            anyhow::bail!("boom");
        }
        Ok(TransformOutcome::Keep(artifact))
    }
}

#[test]
fn commits_to_every_destination() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/scripts/app.js", "console.log('hi');\n");

    let stage = StageBuilder::new("scripts", dir.path())
        .input("src/scripts/**/*.js")
        .strip_prefix("src/scripts")
        .commit_to(dir.path().join(".tmp/js"))
        .commit_to(dir.path().join("dist/js"))
        .build();

    let report = run_stage(&stage).unwrap();
    assert_eq!(report.committed, 1);
    assert_eq!(report.files, vec!["app.js".to_string()]);

    let staged = fs::read(dir.path().join(".tmp/js/app.js")).unwrap();
    let out = fs::read(dir.path().join("dist/js/app.js")).unwrap();
    assert_eq!(staged, out);
    assert_eq!(out, b"console.log('hi');\n");
}

#[test]
fn rerun_on_unchanged_tree_is_byte_identical() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/fonts/a.woff", "AAAA");
    write_file(dir.path(), "src/fonts/deep/b.woff", "BBBB");

    let stage = StageBuilder::new("fonts", dir.path())
        .input("src/fonts/**/*")
        .strip_prefix("src/fonts")
        .commit_to(dir.path().join("dist/fonts"))
        .build();

    let first = run_stage(&stage).unwrap();
    let snapshot = fs::read(dir.path().join("dist/fonts/deep/b.woff")).unwrap();

    let second = run_stage(&stage).unwrap();
    assert_eq!(first.files, second.files);
    assert_eq!(
        snapshot,
        fs::read(dir.path().join("dist/fonts/deep/b.woff")).unwrap()
    );
}

#[test]
fn partials_never_reach_the_commit_step() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/scss/_base.scss", "$c: red;\n");
    write_file(dir.path(), "src/scss/main.scss", "a { color: red; }\n");

    let stage = StageBuilder::new("styles", dir.path())
        .input("src/scss/**/*.scss")
        .strip_prefix("src/scss")
        .transform(Box::new(DropPartials))
        .commit_to(dir.path().join("dist/css"))
        .build();

    let report = run_stage(&stage).unwrap();
    assert_eq!(report.files, vec!["main.scss".to_string()]);
    assert!(!dir.path().join("dist/css/_base.scss").exists());
}

#[test]
fn transform_failure_drops_only_the_failing_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/a.txt", "a");
    write_file(dir.path(), "src/b.txt", "b");

    let stage = StageBuilder::new("texts", dir.path())
        .input("src/*.txt")
        .strip_prefix("src")
        .transform(Box::new(FailOn("a.txt")))
        .commit_to(dir.path().join("dist"))
        .build();

    let report = run_stage(&stage).unwrap();
    assert_eq!(report.files, vec!["b.txt".to_string()]);
    assert!(!dir.path().join("dist/a.txt").exists());
}

#[test]
fn single_star_globs_stay_in_one_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/robots.txt", "User-agent: *\n");
    write_file(dir.path(), "src/images/logo.png", "not-really-a-png");

    let stage = StageBuilder::new("static", dir.path())
        .input("src/*.*")
        .strip_prefix("src")
        .commit_to(dir.path().join("dist"))
        .build();

    let report = run_stage(&stage).unwrap();
    assert_eq!(report.files, vec!["robots.txt".to_string()]);
    assert!(!dir.path().join("dist/images/logo.png").exists());
}

#[test]
fn missing_walk_root_yields_an_empty_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let stage = StageBuilder::new("empty", dir.path().join("nowhere"))
        .input("**/*")
        .commit_to(dir.path().join("dist"))
        .build();

    let report = run_stage(&stage).unwrap();
    assert_eq!(report.committed, 0);
}
