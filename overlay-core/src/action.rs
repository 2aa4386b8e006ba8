//! Actions consumed by the reducer and side effects it emits.

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, Transform};
use crate::persistence::Permission;
use crate::resource::{ImageRef, RasterHandle};
use crate::state::EditingState;

/// Every way scene or editing state can change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Make the decoration at `index` the only selected one.
    SelectBackground(usize),
    /// A photo was captured together with its composited background.
    CapturePhoto {
        /// The camera frame.
        frame: RasterHandle,
        /// Background decoration rendered at capture time.
        composited_background: RasterHandle,
    },
    /// The camera reported a capture error.
    CaptureFailed(String),
    /// Discard the photo and every element.
    ResetPhoto,
    /// Start an export.
    BeginExport,
    /// An export was stored under this reference.
    ExportCompleted(String),
    /// An export failed.
    ExportFailed(String),
    /// Add a picked image on top of the others.
    AddImageElement(ImageRef),
    /// Open the text editor for a new element (`None`) or an existing one.
    BeginTextEdit(Option<ElementId>),
    /// The editor text changed.
    Typing(String),
    /// Clear the editor text.
    ClearText,
    /// Apply an editing state to the scene.
    CommitText(EditingState),
    /// Leave the editor without applying anything.
    ResetEditing,
    /// Replace an element's transform.
    UpdateTransform {
        /// Target element.
        id: ElementId,
        /// New transform.
        transform: Transform,
    },
    /// Remove an element.
    DeleteElement(ElementId),
    /// Pick a font by palette index.
    SelectFont(usize),
    /// Pick a color by palette index.
    SelectColor(usize),
    /// Pick an alignment by palette index.
    SelectAlignment(usize),
    /// Advance to the next alignment.
    CycleAlignment,
    /// The host reported the outcome of a permission request.
    PermissionResult {
        /// The permission asked for.
        permission: Permission,
        /// Whether the user granted it.
        granted: bool,
    },
}

impl Action {
    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectBackground(_) => "select_background",
            Self::CapturePhoto { .. } => "capture_photo",
            Self::CaptureFailed(_) => "capture_failed",
            Self::ResetPhoto => "reset_photo",
            Self::BeginExport => "begin_export",
            Self::ExportCompleted(_) => "export_completed",
            Self::ExportFailed(_) => "export_failed",
            Self::AddImageElement(_) => "add_image_element",
            Self::BeginTextEdit(_) => "begin_text_edit",
            Self::Typing(_) => "typing",
            Self::ClearText => "clear_text",
            Self::CommitText(_) => "commit_text",
            Self::ResetEditing => "reset_editing",
            Self::UpdateTransform { .. } => "update_transform",
            Self::DeleteElement(_) => "delete_element",
            Self::SelectFont(_) => "select_font",
            Self::SelectColor(_) => "select_color",
            Self::SelectAlignment(_) => "select_alignment",
            Self::CycleAlignment => "cycle_alignment",
            Self::PermissionResult { .. } => "permission_result",
        }
    }
}

/// One-shot notifications for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SideEffect {
    /// An export finished and is stored under this reference.
    Completed(String),
    /// Something the user should be told.
    Message(String),
}
