//! Error Handling
//!
//! Unified error type for the failscope library.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use failscope_core::CoreError;
use failscope_llm::LlmError;
use failscope_reports::SourceError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Report parsing and other core errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// LLM transport failure, surfaced unchanged
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Artifact source transport failure, surfaced unchanged
    #[error("Artifact source error: {0}")]
    Source(#[from] SourceError),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this error came from cancellation at any layer
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AppError::Cancelled
                | AppError::Core(CoreError::Cancelled)
                | AppError::Source(SourceError::Cancelled)
        )
    }
}
