// tests/watch_dispatch.rs

//! Change-to-dispatch planning for the dev watch loop.

use assetpipe::pipeline::Pipeline;
use assetpipe::reload::ReloadScope;
use assetpipe::watch::{plan_dispatches, Dispatch};
use assetpipe_test_utils::builders::ConfigFileBuilder;
use assetpipe_test_utils::init_tracing;

fn run(task: &str) -> Dispatch {
    Dispatch::Run(task.to_string())
}

#[test]
fn style_changes_run_the_styles_task() {
    init_tracing();
    let pipeline = Pipeline::new(ConfigFileBuilder::new().build(), false);
    let bindings = pipeline.watch_bindings().unwrap();

    assert_eq!(
        plan_dispatches("src/scss/main.scss", &bindings),
        vec![run("styles")]
    );
    assert_eq!(
        plan_dispatches("src/scss/components/_nav.sass", &bindings),
        vec![run("styles")]
    );
}

#[test]
fn markup_changes_only_reload() {
    init_tracing();
    let pipeline = Pipeline::new(ConfigFileBuilder::new().build(), false);
    let bindings = pipeline.watch_bindings().unwrap();

    assert_eq!(
        plan_dispatches("src/index.html", &bindings),
        vec![Dispatch::Reload(ReloadScope::Full)]
    );
    assert_eq!(
        plan_dispatches("src/pages/about.html", &bindings),
        vec![Dispatch::Reload(ReloadScope::Full)]
    );
}

#[test]
fn manifest_changes_reinject_and_refresh_fonts() {
    init_tracing();
    let pipeline = Pipeline::new(ConfigFileBuilder::new().build(), false);
    let bindings = pipeline.watch_bindings().unwrap();

    assert_eq!(
        plan_dispatches("vendor.toml", &bindings),
        vec![run("inject"), run("fonts")]
    );
}

#[test]
fn fonts_refresh_can_be_switched_off() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().with_refresh_fonts(false).build();
    let pipeline = Pipeline::new(cfg, false);
    let bindings = pipeline.watch_bindings().unwrap();

    assert_eq!(plan_dispatches("vendor.toml", &bindings), vec![run("inject")]);
}

#[test]
fn unrelated_paths_dispatch_nothing() {
    init_tracing();
    let pipeline = Pipeline::new(ConfigFileBuilder::new().build(), false);
    let bindings = pipeline.watch_bindings().unwrap();

    assert!(plan_dispatches("README.md", &bindings).is_empty());
    assert!(plan_dispatches("dist/css/main.css", &bindings).is_empty());
}

#[test]
fn asset_category_changes_run_their_tasks() {
    init_tracing();
    let pipeline = Pipeline::new(ConfigFileBuilder::new().build(), false);
    let bindings = pipeline.watch_bindings().unwrap();

    assert_eq!(
        plan_dispatches("src/scripts/app.js", &bindings),
        vec![run("scripts")]
    );
    assert_eq!(
        plan_dispatches("src/images/logo.png", &bindings),
        vec![run("images")]
    );
    assert_eq!(
        plan_dispatches("src/fonts/body.woff2", &bindings),
        vec![run("fonts")]
    );
}
