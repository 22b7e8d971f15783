// ABOUTME: Error types for the workflow execution engine
// ABOUTME: Defines graph construction errors and engine-level failures

use thiserror::Error;

/// Structural errors detected while building the workflow graph.
///
/// All of these are fatal to the run and are reported before any task
/// executes. Variants are listed in the order the builder checks them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Task at index {index} is missing a non-empty string 'id'")]
    MalformedTask { index: usize },

    #[error("Duplicate task id '{task_id}'")]
    DuplicateTaskId { task_id: String },

    #[error("Unknown plugin '{plugin}' for task '{task_id}'")]
    UnknownPlugin { task_id: String, plugin: String },

    #[error("'depends_on' for task '{task_id}' must be a list of task ids")]
    MalformedDependency { task_id: String },

    #[error("Task '{task_id}' depends on unknown task '{dependency}'")]
    UnknownDependency { task_id: String, dependency: String },

    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Parser error: {0}")]
    Parser(#[from] crate::parser::ParserError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
