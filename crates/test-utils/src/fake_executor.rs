use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetpipe::errors::Result;
use assetpipe::graph::StageExecutor;
use assetpipe::stage::Stage;

/// A fake stage executor that:
/// - records which stages were "run"
/// - succeeds immediately, except for stage names marked as failing.
pub struct FakeStageExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeStageExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            failing: HashSet::new(),
        }
    }

    /// Make the named stage report a failure instead of succeeding.
    pub fn fail_on(mut self, stage: &str) -> Self {
        self.failing.insert(stage.to_string());
        self
    }
}

impl StageExecutor for FakeStageExecutor {
    fn run_stage(
        &self,
        stage: Arc<Stage>,
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        let executed = Arc::clone(&self.executed);
        let fails = self.failing.contains(stage.name());

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(stage.name().to_string());
            }

            if fails {
                return Err(anyhow::anyhow!("stage '{}' failed (fake)", stage.name()).into());
            }
            Ok(1)
        })
    }
}
