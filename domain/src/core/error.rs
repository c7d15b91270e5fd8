//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid tool definition: {0}")]
    InvalidToolDefinition(String),

    #[error("Unknown tool mode: {0}")]
    UnknownToolMode(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
