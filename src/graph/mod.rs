// src/graph/mod.rs

//! Task graph and execution.
//!
//! - [`task`] defines task names and composition (a stage, a sequence, or a
//!   parallel group).
//! - [`graph`] holds the registered tasks and validates the composition
//!   relation is acyclic before anything runs.
//! - [`exec`] runs tasks against a pluggable stage executor.

pub mod exec;
pub mod graph;
pub mod task;

pub use exec::{run_task, LocalStageExecutor, StageExecutor};
pub use graph::TaskGraph;
pub use task::{TaskName, TaskSpec};
