// ABOUTME: Error types for run record persistence
// ABOUTME: Defines specific error types for output module operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write run record: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to serialize run record: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OutputError>;
