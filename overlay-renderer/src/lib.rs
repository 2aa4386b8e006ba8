//! # Photo Overlay Renderer
//!
//! CPU compositing and export for overlay sessions.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//! │  Resolver    │──►│  Compositor  │──►│     Export     │
//! │ images, text │   │  tiny-skia   │   │ spawn_blocking │
//! └──────────────┘   └──────────────┘   └───────┬────────┘
//!                                               │ ExportCompleted / ExportFailed
//!                                               ▼
//!                                       session completion inbox
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compositor;
pub mod error;
pub mod export;
pub mod layout;
pub mod raster;
pub mod resolver;

pub use compositor::Compositor;
pub use error::{RenderError, RenderResult};
pub use export::{export_blocking, spawn_export};
pub use layout::{place, Placement};
pub use resolver::{DefaultResolver, ResourceResolver, TextSpec};
