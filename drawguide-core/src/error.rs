//! Error types for drawing operations.

use thiserror::Error;

/// Result type for drawing operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in core drawing operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A vector path description could not be parsed.
    #[error("Invalid path data at segment {segment}: {message}")]
    PathSyntax {
        /// Index of the segment that failed to parse.
        segment: usize,
        /// What the parser expected or found.
        message: String,
    },

    /// No drawing is stored under the requested name.
    #[error("Drawing not found: {0}")]
    DrawingNotFound(String),

    /// Drawing record serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing the drawing library failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
