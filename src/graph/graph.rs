// src/graph/graph.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{PipelineError, Result};
use crate::graph::task::{TaskName, TaskSpec};
use crate::stage::Stage;

/// Registry of named tasks plus the composition relation between them.
///
/// Registration is order-independent; call [`TaskGraph::validate`] once after
/// the last registration to check every referenced name exists and the
/// composition relation is acyclic. Running an unvalidated graph is safe in
/// the memory sense but a cycle would recurse forever, so validation is a
/// construction-time duty of the caller.
#[derive(Default)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskName, TaskSpec>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `spec` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: impl Into<TaskName>, spec: TaskSpec) {
        self.tasks.insert(name.into(), spec);
    }

    /// Shorthand for registering a single-stage leaf task under the stage's
    /// own name.
    pub fn register_stage(&mut self, stage: Arc<Stage>) {
        self.register(stage.name().to_string(), TaskSpec::Stage(stage));
    }

    pub fn resolve(&self, name: &str) -> Result<&TaskSpec> {
        self.tasks
            .get(name)
            .ok_or_else(|| PipelineError::UnknownTask(name.to_string()))
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Check every composition reference resolves and the relation has no
    /// cycles.
    ///
    /// Edge direction: child -> parent, so a sequence `deploy = [a, b]`
    /// contributes edges `a -> deploy` and `b -> deploy`. A topological sort
    /// fails exactly when composition is cyclic.
    pub fn validate(&self) -> Result<()> {
        for (name, spec) in &self.tasks {
            for child in spec.children() {
                if !self.tasks.contains_key(child) {
                    return Err(PipelineError::Config(format!(
                        "task '{name}' references unknown task '{child}'"
                    )));
                }
            }
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for (name, spec) in &self.tasks {
            for child in spec.children() {
                graph.add_edge(child.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(PipelineError::CyclicTask(cycle.node_id().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_reference_fails_validation() {
        let mut graph = TaskGraph::new();
        graph.register("all", TaskSpec::Seq(vec!["missing".into()]));
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn cycle_fails_validation() {
        let mut graph = TaskGraph::new();
        graph.register("a", TaskSpec::Seq(vec!["b".into()]));
        graph.register("b", TaskSpec::Par(vec!["a".into()]));
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, PipelineError::CyclicTask(_)));
    }

    #[test]
    fn resolve_unknown_task_is_an_error() {
        let graph = TaskGraph::new();
        let err = graph.resolve("nope").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTask(name) if name == "nope"));
    }
}
