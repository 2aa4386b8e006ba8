//! Renderer error types.

use overlay_core::{CoreError, SaveError};
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while compositing or exporting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A pixmap could not be created or converted.
    #[error("Raster error: {0}")]
    Raster(String),

    /// Text could not be rasterized.
    #[error("Text rendering failed: {0}")]
    Text(String),

    /// Encoding the composite failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Storage rejected the composite.
    #[error("Save failed: {0}")]
    Save(#[from] SaveError),

    /// A core type rejected its input.
    #[error(transparent)]
    Core(#[from] CoreError),
}
