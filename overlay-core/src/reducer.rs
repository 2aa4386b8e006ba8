//! The action reducer.
//!
//! [`reduce`] is the only way scene and editing state change. It is pure: the
//! same inputs always produce the same [`Reduction`], and misses (stale ids,
//! out-of-range indices, a second export) leave state untouched.

use tracing::{debug, warn};

use crate::action::{Action, SideEffect};
use crate::background::select_exclusive;
use crate::config::SessionConfig;
use crate::element::{Element, TextAlign};
use crate::state::{EditingState, SceneState};

/// Output of one reducer step.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// New scene state.
    pub state: SceneState,
    /// New editing state.
    pub editing: EditingState,
    /// Side effects, in emission order.
    pub effects: Vec<SideEffect>,
}

impl Reduction {
    fn unchanged(state: &SceneState, editing: &EditingState) -> Self {
        Self {
            state: state.clone(),
            editing: editing.clone(),
            effects: Vec::new(),
        }
    }

    fn with_effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Pick `index` if it addresses a palette of `len` entries.
fn palette_index(index: usize, len: usize, palette: &str) -> Option<usize> {
    if index < len {
        Some(index)
    } else {
        warn!(index, len, palette, "palette index out of range; ignoring");
        None
    }
}

/// Apply `action` to the current state.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn reduce(
    config: &SessionConfig,
    state: &SceneState,
    editing: &EditingState,
    action: Action,
) -> Reduction {
    let mut out = Reduction::unchanged(state, editing);
    let name = action.name();

    match action {
        Action::SelectBackground(index) => {
            if select_exclusive(&mut out.state.background_items, index) {
                out.state.current_background_index = index;
            } else {
                warn!(index, len = state.background_items.len(), "background index out of range");
            }
        }

        Action::CapturePhoto {
            frame,
            composited_background,
        } => {
            out.state.captured_frame = Some(frame);
            out.state.composited_background = Some(composited_background);
        }

        Action::CaptureFailed(reason) => {
            warn!(%reason, "capture failed");
            out = out.with_effect(SideEffect::Message(format!("Failed to take photo: {reason}")));
        }

        Action::ResetPhoto => {
            out.state.captured_frame = None;
            out.state.composited_background = None;
            out.state.elements.clear();
        }

        Action::BeginExport => {
            if state.is_exporting {
                warn!("export already in progress; ignoring");
            } else {
                out.state.is_exporting = true;
            }
        }

        Action::ExportCompleted(reference) if reference.trim().is_empty() => {
            return reduce(
                config,
                state,
                editing,
                Action::ExportFailed("storage returned an empty reference".to_string()),
            );
        }

        Action::ExportCompleted(reference) => {
            out.state.is_exporting = false;
            out.state.captured_frame = None;
            out.state.composited_background = None;
            out.state.last_export_ref = Some(reference.clone());
            out = out.with_effect(SideEffect::Completed(reference));
        }

        Action::ExportFailed(reason) => {
            out.state.is_exporting = false;
            out = out.with_effect(SideEffect::Message(format!("Failed to save photo: {reason}")));
        }

        Action::AddImageElement(image) => {
            let id = out.state.elements.push(Element::image(image));
            debug!(element = %id, "image element added");
        }

        Action::BeginTextEdit(target) => {
            out.editing = match target.as_ref().and_then(|id| state.elements.get(id)) {
                Some(element) => EditingState::for_element(config, element),
                None => {
                    if let Some(id) = target {
                        debug!(element = %id, "edit target not found; starting a new element");
                    }
                    EditingState::defaults_for(config)
                }
            };
        }

        Action::Typing(text) => {
            out.editing.text = text;
        }

        Action::ClearText => {
            out.editing.text.clear();
        }

        Action::CommitText(committed) => {
            let kind = committed.to_kind(config);
            match &committed.target_id {
                None => {
                    let id = out.state.elements.push(Element::new(kind));
                    debug!(element = %id, "text element added");
                }
                Some(id) => {
                    if !out.state.elements.replace_content(id, kind) {
                        debug!(element = %id, "commit target not found; ignoring");
                    }
                }
            }
            out.editing = EditingState::defaults_for(config);
        }

        Action::ResetEditing => {
            out.editing = EditingState::defaults_for(config);
        }

        Action::UpdateTransform { id, transform } => {
            if !out.state.elements.set_transform(&id, transform) {
                debug!(element = %id, "transform target not found; ignoring");
            }
        }

        Action::DeleteElement(id) => {
            if out.state.elements.remove(&id).is_some() {
                debug!(element = %id, "element deleted");
            } else {
                debug!(element = %id, "delete target not found; ignoring");
            }
        }

        Action::SelectFont(index) => {
            if let Some(i) = palette_index(index, config.fonts.len(), "font") {
                out.editing.selected_font_index = Some(i);
            }
        }

        Action::SelectColor(index) => {
            if let Some(i) = palette_index(index, config.colors.len(), "color") {
                out.editing.selected_color_index = Some(i);
            }
        }

        Action::SelectAlignment(index) => {
            if let Some(i) = palette_index(index, TextAlign::CYCLE.len(), "alignment") {
                out.editing.selected_alignment_index = Some(i);
            }
        }

        Action::CycleAlignment => {
            let next = editing
                .selected_alignment_index
                .map_or(0, |current| (current + 1) % TextAlign::CYCLE.len());
            out.editing.selected_alignment_index = Some(next);
        }

        Action::PermissionResult { permission, granted } => {
            if granted {
                debug!(%permission, "permission granted");
            } else {
                warn!(%permission, "permission denied");
                out = out.with_effect(SideEffect::Message(permission.denial_message()));
            }
        }
    }

    debug!(
        action = name,
        elements = out.state.elements.len(),
        photo = out.state.is_photo_taken(),
        exporting = out.state.is_exporting,
        "action reduced"
    );
    out
}
