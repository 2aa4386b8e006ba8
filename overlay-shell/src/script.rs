//! JSON session scripts.
//!
//! A script is a list of steps standing in for what a touch UI would send:
//!
//! ```json
//! { "steps": [
//!     { "step": "select_background", "index": 1 },
//!     { "step": "capture" },
//!     { "step": "add_image", "image": "sticker.png" },
//!     { "step": "gesture", "element": 0, "pan": [40, 0] },
//!     { "step": "export" }
//! ] }
//! ```
//!
//! Elements are addressed by their position in z-order, since ids are only
//! assigned at runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use overlay_core::{
    Action, ElementId, GestureFrame, Permission, Persistence, RasterHandle, Session, SideEffect,
    Vec2,
};
use overlay_renderer::{raster, spawn_export, Compositor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Errors loading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The file could not be read.
    #[error("failed to read script {path}: {source}")]
    Read {
        /// Script path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid script.
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

fn one() -> f32 {
    1.0
}

/// One scripted interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ShellStep {
    /// Report layout geometry.
    Layout {
        /// Center of the editing area.
        scene_center: [f32; 2],
        /// Center of the delete target.
        delete_zone_center: [f32; 2],
    },
    /// Pick a background decoration.
    SelectBackground {
        /// Index, blank entry first.
        index: usize,
    },
    /// Write the live background composite to a PNG.
    Preview {
        /// Output file.
        path: PathBuf,
    },
    /// Take a photo with the selected decoration.
    Capture,
    /// Simulate a camera failure.
    CaptureFailed {
        /// Reported reason.
        reason: String,
    },
    /// Discard the photo and elements.
    ResetPhoto,
    /// Add an image element.
    AddImage {
        /// Image source.
        image: String,
    },
    /// Open the text editor, optionally on an existing element.
    EditText {
        /// Element index to edit, or absent for a new element.
        #[serde(default)]
        element: Option<usize>,
    },
    /// Replace the editor text.
    Type {
        /// New text.
        text: String,
    },
    /// Clear the editor text.
    ClearText,
    /// Pick a font.
    SelectFont {
        /// Palette index.
        index: usize,
    },
    /// Pick a color.
    SelectColor {
        /// Palette index.
        index: usize,
    },
    /// Pick an alignment.
    SelectAlignment {
        /// Palette index.
        index: usize,
    },
    /// Advance the alignment.
    CycleAlignment,
    /// Apply the editor to the scene.
    CommitText,
    /// Close the editor without applying.
    CancelText,
    /// Report an element's measured center.
    Measure {
        /// Element index.
        element: usize,
        /// Measured center.
        center: [f32; 2],
    },
    /// Start a multi-touch gesture.
    GestureBegin {
        /// Element index.
        element: usize,
    },
    /// One gesture frame.
    Gesture {
        /// Element index.
        element: usize,
        /// Zoom since the last frame.
        #[serde(default = "one")]
        scale: f32,
        /// Drag since the last frame.
        #[serde(default)]
        pan: [f32; 2],
        /// Rotation since the last frame, in degrees.
        #[serde(default)]
        rotation: f32,
    },
    /// End a multi-touch gesture.
    GestureEnd {
        /// Element index.
        element: usize,
    },
    /// Report a permission outcome.
    Permission {
        /// Platform permission name.
        name: String,
        /// Whether it was granted.
        granted: bool,
    },
    /// Export and wait for it to finish.
    Export,
}

/// A list of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Steps in order.
    pub steps: Vec<ShellStep>,
}

impl Script {
    /// Parse a script from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a valid script.
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a script file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Capture, add a caption and export.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            steps: vec![
                ShellStep::Capture,
                ShellStep::EditText { element: None },
                ShellStep::Type {
                    text: "Hello".to_string(),
                },
                ShellStep::CommitText,
                ShellStep::Export,
            ],
        }
    }
}

/// What a script run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// References of completed exports.
    pub exports: Vec<String>,
    /// User-facing messages.
    pub messages: Vec<String>,
    /// Elements left in the scene when the script ended.
    pub elements: usize,
}

/// Drives a session from script steps.
pub struct ShellRunner {
    session: Session,
    compositor: Arc<Compositor>,
    persistence: Arc<dyn Persistence>,
    camera_frame: RasterHandle,
    effects: UnboundedReceiver<SideEffect>,
    report: RunReport,
}

impl std::fmt::Debug for ShellRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellRunner")
            .field("session", &self.session)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

fn vec2([x, y]: [f32; 2]) -> Vec2 {
    Vec2::new(x, y)
}

impl ShellRunner {
    /// Create a runner. `camera_frame` stands in for every capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the session's effect receiver was already taken.
    pub fn new(
        mut session: Session,
        compositor: Arc<Compositor>,
        persistence: Arc<dyn Persistence>,
        camera_frame: RasterHandle,
    ) -> anyhow::Result<Self> {
        let effects = session
            .take_effects()
            .ok_or_else(|| anyhow::anyhow!("session effects already taken"))?;
        Ok(Self {
            session,
            compositor,
            persistence,
            camera_frame,
            effects,
            report: RunReport::default(),
        })
    }

    /// The driven session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run every step, then return what was produced.
    ///
    /// Recoverable problems are logged and surfaced as messages; the run
    /// keeps going.
    ///
    /// # Errors
    ///
    /// Returns an error only if a preview file cannot be written.
    pub async fn run(mut self, script: &Script) -> anyhow::Result<RunReport> {
        for (n, step) in script.steps.iter().enumerate() {
            debug!(n, ?step, "step");
            self.step(step).await?;
            self.drain_effects();
        }
        self.report.elements = self.session.state().elements.len();
        Ok(self.report)
    }

    fn drain_effects(&mut self) {
        while let Ok(effect) = self.effects.try_recv() {
            match effect {
                SideEffect::Completed(reference) => {
                    info!(%reference, "photo saved");
                    self.report.exports.push(reference);
                }
                SideEffect::Message(message) => {
                    warn!(%message, "user message");
                    self.report.messages.push(message);
                }
            }
        }
    }

    fn element_id(&self, index: usize) -> Option<ElementId> {
        let id = self
            .session
            .state()
            .elements
            .as_slice()
            .get(index)
            .map(|e| e.id.clone());
        if id.is_none() {
            warn!(index, "no element at this index");
        }
        id
    }

    #[allow(clippy::too_many_lines)]
    async fn step(&mut self, step: &ShellStep) -> anyhow::Result<()> {
        match step {
            ShellStep::Layout {
                scene_center,
                delete_zone_center,
            } => {
                self.session.set_scene_center(vec2(*scene_center));
                self.session.set_delete_zone_center(vec2(*delete_zone_center));
            }
            ShellStep::SelectBackground { index } => {
                self.session.dispatch(Action::SelectBackground(*index));
            }
            ShellStep::Preview { path } => {
                let composite = self.compositor.compose_background(
                    Some(&self.camera_frame),
                    self.session.state().selected_background(),
                )?;
                std::fs::write(path, raster::encode_png(&composite)?)?;
                info!(path = %path.display(), "preview written");
            }
            ShellStep::Capture => {
                let action = match self
                    .compositor
                    .render_decoration(self.session.state().selected_background())
                {
                    Ok(decoration) => Action::CapturePhoto {
                        frame: self.camera_frame.clone(),
                        composited_background: decoration,
                    },
                    Err(e) => Action::CaptureFailed(e.to_string()),
                };
                self.session.dispatch(action);
            }
            ShellStep::CaptureFailed { reason } => {
                self.session.dispatch(Action::CaptureFailed(reason.clone()));
            }
            ShellStep::ResetPhoto => self.session.dispatch(Action::ResetPhoto),
            ShellStep::AddImage { image } => {
                self.session
                    .dispatch(Action::AddImageElement(image.as_str().into()));
            }
            ShellStep::EditText { element } => {
                let target = match element {
                    Some(index) => match self.element_id(*index) {
                        Some(id) => Some(id),
                        None => return Ok(()),
                    },
                    None => None,
                };
                self.session.dispatch(Action::BeginTextEdit(target));
            }
            ShellStep::Type { text } => self.session.dispatch(Action::Typing(text.clone())),
            ShellStep::ClearText => self.session.dispatch(Action::ClearText),
            ShellStep::SelectFont { index } => self.session.dispatch(Action::SelectFont(*index)),
            ShellStep::SelectColor { index } => self.session.dispatch(Action::SelectColor(*index)),
            ShellStep::SelectAlignment { index } => {
                self.session.dispatch(Action::SelectAlignment(*index));
            }
            ShellStep::CycleAlignment => self.session.dispatch(Action::CycleAlignment),
            ShellStep::CommitText => {
                let editing = self.session.editing().clone();
                self.session.dispatch(Action::CommitText(editing));
            }
            ShellStep::CancelText => self.session.dispatch(Action::ResetEditing),
            ShellStep::Measure { element, center } => {
                if let Some(id) = self.element_id(*element) {
                    self.session.measure_element_center(&id, vec2(*center));
                }
            }
            ShellStep::GestureBegin { element } => {
                if let Some(id) = self.element_id(*element) {
                    self.session.set_transform_in_progress(&id, true);
                }
            }
            ShellStep::Gesture {
                element,
                scale,
                pan,
                rotation,
            } => {
                if let Some(id) = self.element_id(*element) {
                    let frame = GestureFrame {
                        scale_change: *scale,
                        pan_delta: vec2(*pan),
                        rotation_change: *rotation,
                    };
                    if let Some(step) = self.session.gesture_frame(&id, &frame) {
                        debug!(
                            guides = ?self.session.guides(),
                            center = ?step.transform.center_offset,
                            "gesture applied"
                        );
                    }
                }
            }
            ShellStep::GestureEnd { element } => {
                if let Some(id) = self.element_id(*element) {
                    self.session.set_transform_in_progress(&id, false);
                }
            }
            ShellStep::Permission { name, granted } => {
                self.session.dispatch(Action::PermissionResult {
                    permission: Permission::from_name(name),
                    granted: *granted,
                });
            }
            ShellStep::Export => {
                if let Some(request) = self.session.prepare_export() {
                    let _worker = spawn_export(
                        request,
                        Arc::clone(&self.compositor),
                        Arc::clone(&self.persistence),
                        self.session.completion_sender(),
                    );
                    self.session.next_completion().await;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json(
            r#"{ "steps": [
                { "step": "layout", "scene_center": [540, 720], "delete_zone_center": [540, 1380] },
                { "step": "gesture", "element": 0, "pan": [10, 0] },
                { "step": "edit_text" },
                { "step": "permission", "name": "android.permission.CAMERA", "granted": false },
                { "step": "export" }
            ] }"#,
        )
        .expect("parse");
        assert_eq!(script.steps.len(), 5);
        assert_eq!(
            script.steps[1],
            ShellStep::Gesture {
                element: 0,
                scale: 1.0,
                pan: [10.0, 0.0],
                rotation: 0.0,
            }
        );
        assert_eq!(script.steps[2], ShellStep::EditText { element: None });
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(matches!(
            Script::from_json(r#"{ "steps": [ { "step": "teleport" } ] }"#),
            Err(ScriptError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Script::load(Path::new("/no/such/script.json")).expect_err("missing");
        assert!(err.to_string().contains("/no/such/script.json"));
    }
}
