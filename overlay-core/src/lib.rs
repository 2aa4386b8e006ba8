//! # Photo Overlay Core
//!
//! Scene model and interaction logic for composing text and image overlays on
//! a captured photo.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                overlay-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Gesture Engine  │  Action Reducer          │
//! │  - Pinch/rotate  │  - Scene state           │
//! │  - Center snap   │  - Editing state         │
//! │  - Delete zone   │  - Side effects          │
//! ├─────────────────────────────────────────────┤
//! │  Element Store   │  Session                 │
//! │  - Z-order       │  - watch/mpsc channels   │
//! │  - Transforms    │  - Export completions    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Rendering and storage live elsewhere; this crate only defines the
//! [`Persistence`] seam they plug into.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod background;
pub mod config;
pub mod element;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod persistence;
pub mod reducer;
pub mod resource;
pub mod session;
pub mod state;
pub mod store;

pub use action::{Action, SideEffect};
pub use background::{Anchor, BackgroundItem, Layout, Padding};
pub use config::{FontOption, GestureTuning, RenderSettings, SessionConfig, DEFAULT_FOLDER_NAME};
pub use element::{Element, ElementId, ElementKind, TextAlign, Transform};
pub use error::{CoreError, CoreResult};
pub use geometry::Vec2;
pub use gesture::{rendered_scale, GestureContext, GestureFrame, GestureStep, GestureTracker};
pub use persistence::{Permission, Persistence, SaveError};
pub use reducer::{reduce, Reduction};
pub use resource::{ColorRef, FontRef, ImageRef, RasterHandle};
pub use session::{ExportRequest, GuideState, Session};
pub use state::{EditingState, SceneState};
pub use store::ElementStore;

/// Overlay core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
