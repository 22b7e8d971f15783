// ABOUTME: Main library module for the oprun workflow orchestrator
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod output;
pub mod parser;
pub mod plugins;

// Re-export commonly used types
pub use engine::{
    GraphError, RunStatus, RunSummary, SharedContext, TaskOutcome, WorkflowEngine, WorkflowGraph,
};
pub use output::RunWriter;
pub use parser::{TaskDeclaration, WorkflowSource};
pub use plugins::{Capability, PluginRegistry};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
