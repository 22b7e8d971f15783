// ABOUTME: Workflow execution engine module for the oprun orchestrator
// ABOUTME: Handles graph construction, concurrent scheduling, and run recording

pub mod context;
pub mod error;
pub mod executor;
pub mod graph;
pub mod result;

pub use context::SharedContext;
pub use error::{EngineError, GraphError, Result};
pub use executor::WorkflowEngine;
pub use graph::{TaskNode, WorkflowGraph};
pub use result::{RunEvent, RunRecorder, RunStatus, RunSummary, TaskOutcome, UnitState};
