// tests/markup_build.rs

//! Build-block concatenation for production markup.

use assetpipe::stage::html::BuildBlocks;
use assetpipe::stage::{Artifact, Transform, TransformOutcome};
use assetpipe_test_utils::builders::write_file;
use assetpipe_test_utils::init_tracing;

const PAGE: &str = r#"<html>
<head>
<!-- build:css css/site.min.css -->
<link rel="stylesheet" href="/css/a.css">
<!-- endbuild -->
</head>
<body>
<!-- build:js js/site.min.js -->
<script src="/js/a.js"></script>
<script src="/js/b.js"></script>
<!-- endbuild -->
</body>
</html>
"#;

#[test]
fn blocks_concatenate_minify_and_rewrite() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "css/a.css", "a {\n  color: red;\n}\n");
    write_file(dir.path(), "js/a.js", "var first = 1;\n");
    write_file(dir.path(), "js/b.js", "var second = first + 1;\n");

    let blocks = BuildBlocks::new(vec![dir.path().to_path_buf()]);
    let outcome = blocks
        .apply(Artifact::new("index.html", PAGE.as_bytes().to_vec()))
        .unwrap();

    let artifacts = match outcome {
        TransformOutcome::Expand(a) => a,
        other => panic!("expected Expand, got {other:?}"),
    };
    assert_eq!(artifacts.len(), 3);

    let page = artifacts[0].text().unwrap();
    assert!(page.contains(r#"<link rel="stylesheet" href="css/site.min.css">"#));
    assert!(page.contains(r#"<script src="js/site.min.js"></script>"#));
    assert!(!page.contains("endbuild"));
    assert!(!page.contains("/js/a.js"));

    let css = artifacts
        .iter()
        .find(|a| a.rel_path.to_string_lossy() == "css/site.min.css")
        .expect("css bundle artifact");
    assert_eq!(css.text().unwrap(), "a{color:red}");

    let js = artifacts
        .iter()
        .find(|a| a.rel_path.to_string_lossy() == "js/site.min.js")
        .expect("js bundle artifact");
    let js_text = js.text().unwrap();
    assert!(js_text.len() < "var first = 1;\nvar second = first + 1;\n".len());
}

#[test]
fn missing_reference_fails_the_page() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let blocks = BuildBlocks::new(vec![dir.path().to_path_buf()]);
    let page = "<!-- build:js js/x.min.js -->\n<script src=\"/js/missing.js\"></script>\n<!-- endbuild -->";
    let err = blocks
        .apply(Artifact::new("index.html", page.as_bytes().to_vec()))
        .unwrap_err();
    assert!(err.to_string().contains("/js/missing.js"));
}

#[test]
fn pages_without_blocks_pass_through() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let blocks = BuildBlocks::new(vec![dir.path().to_path_buf()]);
    let artifact = Artifact::new("about.html", b"<html><body>hi</body></html>".to_vec());
    match blocks.apply(artifact.clone()).unwrap() {
        TransformOutcome::Expand(artifacts) => {
            assert_eq!(artifacts, vec![artifact]);
        }
        other => panic!("expected Expand, got {other:?}"),
    }
}
