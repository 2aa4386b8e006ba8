//! Storage and permission boundaries.
//!
//! The engine never writes files or prompts for permissions itself. Hosts
//! implement [`Persistence`] for their storage, and report permission outcomes
//! back as [`crate::Action::PermissionResult`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_FOLDER_NAME;
use crate::resource::RasterHandle;

/// Why a save did not produce a usable reference.
#[derive(Error, Debug)]
pub enum SaveError {
    /// The storage write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The raster could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Storage accepted the write but returned no reference.
    #[error("storage returned an empty reference")]
    EmptyReference,
}

/// Writes exported rasters somewhere durable.
///
/// Implementations run on a blocking worker thread, so they may do synchronous
/// I/O freely.
pub trait Persistence: Send + Sync {
    /// Store `raster` under `folder_name` and return a reference to it.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] if encoding or writing fails.
    fn save(&self, raster: &RasterHandle, folder_name: &str) -> Result<String, SaveError>;
}

/// The folder an export lands in: `folder_name`, or [`DEFAULT_FOLDER_NAME`]
/// when it is blank.
#[must_use]
pub fn resolve_folder(folder_name: &str) -> &str {
    if folder_name.trim().is_empty() {
        DEFAULT_FOLDER_NAME
    } else {
        folder_name
    }
}

/// A capability the host asked the user for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Camera access.
    Camera,
    /// Reading or writing shared media storage.
    Storage,
    /// Anything else, by platform name.
    Other(String),
}

impl Permission {
    /// Classify a platform permission name such as `android.permission.CAMERA`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let short = name.rsplit('.').next().unwrap_or(name);
        if short == "CAMERA" {
            Self::Camera
        } else if short.ends_with("_EXTERNAL_STORAGE") || short.starts_with("READ_MEDIA_") {
            Self::Storage
        } else {
            Self::Other(name.to_string())
        }
    }

    /// Message shown to the user when this permission is denied.
    #[must_use]
    pub fn denial_message(&self) -> String {
        match self {
            Self::Camera => "Camera permission is required to take a photo".to_string(),
            Self::Storage => "Storage permission is required to save the photo".to_string(),
            Self::Other(name) => format!("Permission {name} was denied"),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => f.write_str("camera"),
            Self::Storage => f.write_str("storage"),
            Self::Other(name) => f.write_str(name),
        }
    }
}
