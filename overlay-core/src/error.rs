//! Error types for overlay core operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while configuring or driving a session.
///
/// Reducer transitions never fail: stale ids and rejected actions are no-ops.
/// These errors cover the edges of the core where input comes from outside,
/// such as configuration files.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A color string could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// A raster buffer did not match its declared dimensions.
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),
}
