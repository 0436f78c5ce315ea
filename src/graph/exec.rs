// src/graph/exec.rs

//! Task execution against a pluggable stage executor.
//!
//! The driver recurses through [`TaskSpec`] composition and only touches
//! stages through the [`StageExecutor`] trait, so tests can record what ran
//! without doing any filesystem work.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::debug;

use crate::errors::Result;
use crate::graph::graph::TaskGraph;
use crate::graph::task::TaskSpec;
use crate::reload::{ReloadNotifier, ReloadScope};
use crate::stage::{run_stage, Stage};

/// How leaf stages are executed.
///
/// Production code uses [`LocalStageExecutor`]; tests can provide their own
/// implementation that records scheduled stages instead of running them.
pub trait StageExecutor: Send + Sync {
    /// Run one stage to completion, returning the number of committed files.
    fn run_stage(
        &self,
        stage: Arc<Stage>,
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>>;
}

/// Executor running stages in-process on the blocking thread pool.
///
/// Stage work is synchronous filesystem and CPU work, so it goes through
/// `spawn_blocking` rather than blocking the async runtime. On success the
/// stage's reload scope, if any, is forwarded to connected browsers.
pub struct LocalStageExecutor {
    notifier: Option<ReloadNotifier>,
}

impl LocalStageExecutor {
    pub fn new(notifier: Option<ReloadNotifier>) -> Self {
        Self { notifier }
    }
}

impl StageExecutor for LocalStageExecutor {
    fn run_stage(
        &self,
        stage: Arc<Stage>,
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        Box::pin(async move {
            let runner_stage = Arc::clone(&stage);
            let report = tokio::task::spawn_blocking(move || run_stage(&runner_stage))
                .await
                .map_err(|e| anyhow!("stage '{}' panicked: {e}", stage.name()))??;

            if let Some(notifier) = &self.notifier {
                match stage.reload() {
                    Some(ReloadScope::Full) => notifier.notify_full(),
                    Some(ReloadScope::StyleOnly) => {
                        let css: Vec<String> = report
                            .files
                            .iter()
                            .filter(|f| f.ends_with(".css"))
                            .cloned()
                            .collect();
                        notifier.notify_style(css);
                    }
                    None => {}
                }
            }

            Ok(report.committed)
        })
    }
}

/// Run the named task and everything it composes.
///
/// Sequences stop at the first failure. Parallel groups let every member
/// settle and then report the first failure, so one member's error never
/// cancels a sibling mid-commit.
pub fn run_task(
    graph: Arc<TaskGraph>,
    exec: Arc<dyn StageExecutor>,
    name: String,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
    Box::pin(async move {
        let spec = graph.resolve(&name)?.clone();
        debug!(task = %name, ?spec, "running task");

        match spec {
            TaskSpec::Stage(stage) => {
                exec.run_stage(stage).await?;
            }
            TaskSpec::Seq(children) => {
                for child in children {
                    run_task(Arc::clone(&graph), Arc::clone(&exec), child).await?;
                }
            }
            TaskSpec::Par(children) => {
                let mut set = JoinSet::new();
                for child in children {
                    set.spawn(run_task(Arc::clone(&graph), Arc::clone(&exec), child));
                }

                let mut first_failure = None;
                while let Some(joined) = set.join_next().await {
                    let outcome = joined.map_err(|e| anyhow!("task in '{name}' panicked: {e}"))?;
                    if let Err(err) = outcome {
                        if first_failure.is_none() {
                            first_failure = Some(err);
                        }
                    }
                }
                if let Some(err) = first_failure {
                    return Err(err);
                }
            }
        }

        Ok(())
    })
}
