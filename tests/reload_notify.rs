// tests/reload_notify.rs

//! Reload scope wiring from stage completion to connected clients.

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use assetpipe::graph::{LocalStageExecutor, StageExecutor};
use assetpipe::reload::{ReloadNotifier, ReloadScope};
use assetpipe_test_utils::builders::{write_file, StageBuilder};
use assetpipe_test_utils::{init_tracing, with_timeout};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::WebSocket;

fn connect(port: u16) -> WebSocket<MaybeTlsStream<TcpStream>> {
    let (mut ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
    if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
    }
    let hello = ws.read().unwrap().into_text().unwrap();
    assert!(hello.contains("connected"), "got: {hello}");
    ws
}

#[tokio::test(flavor = "multi_thread")]
async fn style_stage_success_sends_exactly_one_style_reload() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/scss/main.css", "a { color: red; }\n");

    let notifier = ReloadNotifier::start(37150).unwrap();
    let mut client = connect(notifier.port());
    // Give the acceptor a beat to file the client into the broadcast list.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stage = StageBuilder::new("styles", dir.path())
        .input("src/scss/**/*.css")
        .strip_prefix("src/scss")
        .commit_to(dir.path().join("dist/css"))
        .build()
        .with_reload(ReloadScope::StyleOnly);

    let exec = LocalStageExecutor::new(Some(notifier.clone()));
    let committed = with_timeout(exec.run_stage(Arc::new(stage))).await.unwrap();
    assert_eq!(committed, 1);

    let msg = client.read().unwrap().into_text().unwrap();
    assert!(msg.contains("\"type\":\"css\""), "got: {msg}");
    assert!(msg.contains("main.css"), "got: {msg}");
    // No second message: a style rebuild never forces a full page reload.
    assert!(client.read().is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn full_scope_stage_sends_a_page_reload() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "src/fonts/body.woff2", "woff2-bytes");

    let notifier = ReloadNotifier::start(37170).unwrap();
    let mut client = connect(notifier.port());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stage = StageBuilder::new("fonts-local", dir.path())
        .input("src/fonts/**/*")
        .strip_prefix("src/fonts")
        .commit_to(dir.path().join("dist/fonts"))
        .build()
        .with_reload(ReloadScope::Full);

    let exec = LocalStageExecutor::new(Some(notifier.clone()));
    with_timeout(exec.run_stage(Arc::new(stage))).await.unwrap();

    let msg = client.read().unwrap().into_text().unwrap();
    assert!(msg.contains("\"type\":\"reload\""), "got: {msg}");
}
