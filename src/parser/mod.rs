// ABOUTME: Workflow source decoding module for the oprun orchestrator
// ABOUTME: Turns YAML workflow files into in-memory task declarations

pub mod error;
pub mod workflow;

pub use error::{ParserError, Result};
pub use workflow::{TaskDeclaration, WorkflowSource};
