// ABOUTME: Run persistence module for the oprun orchestrator
// ABOUTME: Writes run summaries and execution logs to per-run directories

pub mod error;
pub mod writer;

pub use error::{OutputError, Result};
pub use writer::RunWriter;
