// tests/vendor_fonts.rs

//! Manifest-driven vendor font copying.

use std::fs;

use assetpipe::stage::fonts::VendorFonts;
use assetpipe::stage::run_stage;
use assetpipe_test_utils::builders::{write_file, StageBuilder};
use assetpipe_test_utils::init_tracing;

const MANIFEST: &str = r#"
[[package]]
name = "lib-a"
version = "1.2"
assets = ["vendor/lib-a/lib-a.css", "vendor/lib-a/fonts/site.woff2"]

[[package]]
name = "lib-b"
version = "3.0"
assets = ["vendor/lib-b/lib-b.js", "vendor/lib-b/fonts/icons.ttf"]
"#;

fn vendor_stage(root: &std::path::Path) -> assetpipe::stage::Stage {
    StageBuilder::new("fonts-vendor", root)
        .input("vendor.toml")
        .transform(Box::new(VendorFonts::new(root.join("vendor.toml"))))
        .commit_to(root.join(".tmp/fonts"))
        .commit_to(root.join("dist/fonts"))
        .build()
}

#[test]
fn vendor_fonts_land_flat_in_every_destination() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "vendor.toml", MANIFEST);
    write_file(dir.path(), "vendor/lib-a/lib-a.css", "a{}");
    write_file(dir.path(), "vendor/lib-a/fonts/site.woff2", "woff2-bytes");
    write_file(dir.path(), "vendor/lib-b/lib-b.js", "var x;");
    write_file(dir.path(), "vendor/lib-b/fonts/icons.ttf", "ttf-bytes");

    let report = run_stage(&vendor_stage(dir.path())).unwrap();
    assert_eq!(
        report.files,
        vec!["icons.ttf".to_string(), "site.woff2".to_string()]
    );

    let staged = fs::read_to_string(dir.path().join(".tmp/fonts/site.woff2")).unwrap();
    assert_eq!(staged, "woff2-bytes");
    assert!(dir.path().join("dist/fonts/icons.ttf").is_file());
    // Script and style assets belong to other stages.
    assert!(!dir.path().join("dist/fonts/lib-a.css").exists());
}

#[test]
fn missing_listed_font_does_not_fail_the_rest() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "vendor.toml", MANIFEST);
    write_file(dir.path(), "vendor/lib-a/fonts/site.woff2", "woff2-bytes");
    // lib-b's icons.ttf is listed but absent.

    let report = run_stage(&vendor_stage(dir.path())).unwrap();
    assert_eq!(report.files, vec!["site.woff2".to_string()]);
}

#[test]
fn manifest_without_fonts_commits_nothing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "vendor.toml",
        r#"
        [[package]]
        name = "lib-a"
        version = "1.2"
        assets = ["vendor/lib-a/lib-a.js"]
        "#,
    );
    write_file(dir.path(), "vendor/lib-a/lib-a.js", "var x;");

    let report = run_stage(&vendor_stage(dir.path())).unwrap();
    assert_eq!(report.committed, 0);
}

#[test]
fn manifest_edits_are_picked_up_on_rerun() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "vendor.toml",
        r#"
        [[package]]
        name = "lib-a"
        version = "1.2"
        assets = ["vendor/lib-a/fonts/site.woff2"]
        "#,
    );
    write_file(dir.path(), "vendor/lib-a/fonts/site.woff2", "woff2-bytes");

    let stage = vendor_stage(dir.path());
    let first = run_stage(&stage).unwrap();
    assert_eq!(first.files, vec!["site.woff2".to_string()]);

    write_file(dir.path(), "vendor.toml", MANIFEST);
    write_file(dir.path(), "vendor/lib-a/lib-a.css", "a{}");
    write_file(dir.path(), "vendor/lib-b/lib-b.js", "var x;");
    write_file(dir.path(), "vendor/lib-b/fonts/icons.ttf", "ttf-bytes");

    let second = run_stage(&stage).unwrap();
    assert_eq!(
        second.files,
        vec!["icons.ttf".to_string(), "site.woff2".to_string()]
    );
}
