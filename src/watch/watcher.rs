// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::graph::{run_task, StageExecutor, TaskGraph};
use crate::reload::{ReloadNotifier, ReloadScope};
use crate::watch::path_utils::relative_str;
use crate::watch::{plan_dispatches, Dispatch, WatchBinding};

/// Handle keeping the underlying `RecommendedWatcher` alive. Dropping it
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and turn changes into task runs and reload
/// signals per the bindings.
///
/// Each `Run` dispatch is spawned as its own tokio task, so a slow stage
/// never blocks the event loop; a change arriving while its task is still
/// running simply produces a second run.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    graph: Arc<TaskGraph>,
    exec: Arc<dyn StageExecutor>,
    notifier: Option<ReloadNotifier>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // tracing is not safe to assume inside the notify callback.
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        let bindings = Arc::new(bindings);

        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for path in event.paths {
                let Some(rel) = relative_str(&root, &path) else {
                    warn!(?path, ?root, "could not relativize event path");
                    continue;
                };

                for dispatch in plan_dispatches(&rel, &bindings) {
                    match dispatch {
                        Dispatch::Run(task) => {
                            debug!(task = %task, path = %rel, "change triggers task");
                            let graph = Arc::clone(&graph);
                            let exec = Arc::clone(&exec);
                            tokio::spawn(async move {
                                if let Err(err) =
                                    run_task(graph, exec, task.clone()).await
                                {
                                    error!(task = %task, error = %err, "watch-triggered task failed");
                                }
                            });
                        }
                        Dispatch::Reload(scope) => {
                            if let Some(notifier) = &notifier {
                                debug!(path = %rel, ?scope, "change triggers reload");
                                match scope {
                                    ReloadScope::Full => notifier.notify_full(),
                                    ReloadScope::StyleOnly => {
                                        notifier.notify_style(vec![rel.clone()])
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
