//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A drawing surface could not be allocated (zero or oversized).
    #[error("Surface error: {0}")]
    Surface(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Encoding a still image failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Building an animation failed.
    #[error("Animation failed: {0}")]
    Animation(String),
}
