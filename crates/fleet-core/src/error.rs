//! Error types for fleet-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid status filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
