// src/graph/task.rs

use std::sync::Arc;

use crate::stage::Stage;

pub type TaskName = String;

/// How a named task is composed.
///
/// Composition is by name, so a sequence or group can reference tasks that
/// are registered later; [`TaskGraph::validate`](crate::graph::TaskGraph::validate)
/// checks the references once the full graph is assembled.
#[derive(Clone)]
pub enum TaskSpec {
    /// A leaf task running one stage.
    Stage(Arc<Stage>),
    /// Run the named tasks one after another, stopping at the first failure.
    Seq(Vec<TaskName>),
    /// Run the named tasks concurrently; all of them settle before the
    /// group's result is known.
    Par(Vec<TaskName>),
}

impl TaskSpec {
    /// Names of directly referenced child tasks (empty for a stage).
    pub fn children(&self) -> &[TaskName] {
        match self {
            TaskSpec::Stage(_) => &[],
            TaskSpec::Seq(names) | TaskSpec::Par(names) => names,
        }
    }
}

impl std::fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskSpec::Stage(stage) => f.debug_tuple("Stage").field(&stage.name()).finish(),
            TaskSpec::Seq(names) => f.debug_tuple("Seq").field(names).finish(),
            TaskSpec::Par(names) => f.debug_tuple("Par").field(names).finish(),
        }
    }
}
