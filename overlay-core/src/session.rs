//! # Session
//!
//! The explicit state container a host drives.
//!
//! ```text
//!  host ──dispatch(Action)──► reduce() ──► SceneState ──watch──► subscribers
//!   ▲                              │
//!   │                              └──► SideEffect ──mpsc──► take_effects()
//!   │
//!   └── export worker ──completion_sender()──► pump() / next_completion()
//! ```
//!
//! A session is single-threaded: every state change happens inside
//! [`Session::dispatch`]. Background work talks back only through the
//! completion inbox.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::action::{Action, SideEffect};
use crate::config::SessionConfig;
use crate::element::{Element, ElementId};
use crate::geometry::Vec2;
use crate::gesture::{measured, GestureContext, GestureFrame, GestureStep, GestureTracker};
use crate::reducer::reduce;
use crate::resource::RasterHandle;
use crate::state::{EditingState, SceneState};

/// Flags the host uses to draw center guides and the delete target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuideState {
    /// Some element is being dragged.
    pub dragging: bool,
    /// Show the vertical center guide.
    pub near_vertical_center: bool,
    /// Show the horizontal center guide.
    pub near_horizontal_center: bool,
    /// The dragged element is over the delete target.
    pub delete_zone_hot: bool,
}

/// Snapshot of everything an export needs, taken when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// The captured camera frame.
    pub frame: RasterHandle,
    /// Decoration composited at capture time.
    pub composited_background: RasterHandle,
    /// Elements in z-order.
    pub elements: Vec<Element>,
    /// Destination folder, already defaulted.
    pub folder_name: String,
}

/// A photo-overlay editing session.
#[derive(Debug)]
pub struct Session {
    config: Arc<SessionConfig>,
    state: SceneState,
    editing: EditingState,
    context: GestureContext,
    trackers: HashMap<ElementId, GestureTracker>,
    state_tx: watch::Sender<SceneState>,
    effects_tx: mpsc::UnboundedSender<SideEffect>,
    effects_rx: Option<mpsc::UnboundedReceiver<SideEffect>>,
    completions_tx: mpsc::UnboundedSender<Action>,
    completions_rx: mpsc::UnboundedReceiver<Action>,
}

impl Session {
    /// Start a session with the given configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    /// Start a session sharing an existing configuration.
    #[must_use]
    pub fn with_shared_config(config: Arc<SessionConfig>) -> Self {
        let state = SceneState::from_config(&config);
        let editing = EditingState::defaults_for(&config);
        let (state_tx, _) = watch::channel(state.clone());
        let (effects_tx, effects_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        debug!(
            backgrounds = state.background_items.len(),
            folder = config.effective_folder_name(),
            "session created"
        );

        Self {
            config,
            state,
            editing,
            context: GestureContext::default(),
            trackers: HashMap::new(),
            state_tx,
            effects_tx,
            effects_rx: Some(effects_rx),
            completions_tx,
            completions_rx,
        }
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<SessionConfig> {
        &self.config
    }

    /// Current scene state.
    #[must_use]
    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Current editing state.
    #[must_use]
    pub fn editing(&self) -> &EditingState {
        &self.editing
    }

    /// Look up an element.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.state.elements.get(id)
    }

    /// Watch scene state. The receiver always sees the latest state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SceneState> {
        self.state_tx.subscribe()
    }

    /// Take the side-effect receiver. Only the first call gets it.
    pub fn take_effects(&mut self) -> Option<mpsc::UnboundedReceiver<SideEffect>> {
        self.effects_rx.take()
    }

    /// A sender background workers use to report completions.
    #[must_use]
    pub fn completion_sender(&self) -> mpsc::UnboundedSender<Action> {
        self.completions_tx.clone()
    }

    /// Apply an action.
    pub fn dispatch(&mut self, action: Action) {
        let reduction = reduce(&self.config, &self.state, &self.editing, action);
        self.state = reduction.state;
        self.editing = reduction.editing;

        let elements = &self.state.elements;
        self.trackers.retain(|id, _| elements.get(id).is_some());

        self.state_tx.send_replace(self.state.clone());
        for effect in reduction.effects {
            if self.effects_tx.send(effect).is_err() {
                debug!("side-effect receiver dropped");
            }
        }
    }

    /// Apply every completion already waiting in the inbox. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.completions_rx.try_recv() {
            self.dispatch(action);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it.
    pub async fn next_completion(&mut self) -> bool {
        match self.completions_rx.recv().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    /// Record the center of the editing area.
    pub fn set_scene_center(&mut self, center: Vec2) {
        self.context.scene_center = center;
    }

    /// Record the center of the delete target.
    pub fn set_delete_zone_center(&mut self, center: Vec2) {
        self.context.delete_zone_center = center;
        for (id, tracker) in &mut self.trackers {
            if let Some(element) = self.state.elements.get(id) {
                tracker.refresh(&element.transform, &self.context, &self.config.gesture);
            }
        }
    }

    fn tracker(&mut self, id: &ElementId) -> Option<&mut GestureTracker> {
        let element = self.state.elements.get(id)?;
        let context = &self.context;
        let tuning = &self.config.gesture;
        Some(self.trackers.entry(id.clone()).or_insert_with(|| {
            let mut tracker = GestureTracker::new(id.clone());
            tracker.refresh(&element.transform, context, tuning);
            tracker
        }))
    }

    /// Report an element's on-screen center after layout.
    ///
    /// Only the first non-zero measurement is kept.
    pub fn measure_element_center(&mut self, id: &ElementId, center: Vec2) {
        let Some(transform) = self
            .element(id)
            .and_then(|element| measured(&element.transform, center))
        else {
            return;
        };
        self.dispatch(Action::UpdateTransform {
            id: id.clone(),
            transform,
        });
        let context = self.context;
        let tuning = self.config.gesture;
        if let Some(tracker) = self.tracker(id) {
            tracker.refresh(&transform, &context, &tuning);
        }
    }

    /// Feed one gesture frame for an element.
    ///
    /// Returns the step that was applied, or `None` if the element is gone.
    pub fn gesture_frame(&mut self, id: &ElementId, frame: &GestureFrame) -> Option<GestureStep> {
        let current = self.element(id)?.transform;
        let context = self.context;
        let tuning = self.config.gesture;
        let step = self.tracker(id)?.apply(&current, frame, &context, &tuning);
        self.dispatch(Action::UpdateTransform {
            id: id.clone(),
            transform: step.transform,
        });
        Some(step)
    }

    /// Report whether a multi-touch gesture on `id` is active.
    ///
    /// Releasing an element over the delete target deletes it and closes the
    /// editor.
    pub fn set_transform_in_progress(&mut self, id: &ElementId, in_progress: bool) {
        let Some(tracker) = self.tracker(id) else {
            debug!(element = %id, "gesture on unknown element; ignoring");
            return;
        };
        if let Some(doomed) = tracker.set_in_progress(in_progress) {
            self.dispatch(Action::DeleteElement(doomed));
            self.dispatch(Action::ResetEditing);
        }
    }

    /// Guide flags for the element currently being dragged.
    #[must_use]
    pub fn guides(&self) -> GuideState {
        self.trackers
            .values()
            .find(|tracker| tracker.is_in_progress())
            .map_or_else(GuideState::default, |tracker| {
                let (near_vertical_center, near_horizontal_center) = tracker.near_center();
                GuideState {
                    dragging: true,
                    near_vertical_center,
                    near_horizontal_center,
                    delete_zone_hot: tracker.is_inside_delete_zone(),
                }
            })
    }

    /// Begin an export and snapshot what it needs.
    ///
    /// Returns `None` if an export is already running or no photo has been
    /// taken; in the latter case the export flag is released with a message.
    pub fn prepare_export(&mut self) -> Option<ExportRequest> {
        if self.state.is_exporting {
            warn!("export already in progress");
            return None;
        }
        self.dispatch(Action::BeginExport);

        let (Some(frame), Some(composited_background)) = (
            self.state.captured_frame.clone(),
            self.state.composited_background.clone(),
        ) else {
            self.dispatch(Action::ExportFailed("no photo has been taken".to_string()));
            return None;
        };

        let request = ExportRequest {
            frame,
            composited_background,
            elements: self.state.elements.as_slice().to_vec(),
            folder_name: self.config.effective_folder_name().to_string(),
        };
        info!(
            elements = request.elements.len(),
            folder = %request.folder_name,
            "export prepared"
        );
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ColorRef, ImageRef};

    fn session() -> Session {
        let mut session = Session::new(SessionConfig::default());
        session.set_scene_center(Vec2::new(500.0, 800.0));
        session.set_delete_zone_center(Vec2::new(500.0, 1500.0));
        session
    }

    fn capture() -> Action {
        Action::CapturePhoto {
            frame: RasterHandle::solid(2, 2, ColorRef::BLACK),
            composited_background: RasterHandle::solid(2, 2, ColorRef::rgba(0, 0, 0, 0)),
        }
    }

    fn add_image(session: &mut Session) -> ElementId {
        session.dispatch(Action::AddImageElement(ImageRef::new("sticker.png")));
        session.state().elements.iter().last().expect("element").id.clone()
    }

    #[test]
    fn test_dispatch_publishes_state() {
        let mut session = session();
        let rx = session.subscribe();
        let id = add_image(&mut session);
        assert!(rx.borrow().elements.get(&id).is_some());
    }

    #[test]
    fn test_effects_delivered_in_order() {
        let mut session = session();
        let mut effects = session.take_effects().expect("receiver");
        assert!(session.take_effects().is_none());

        session.dispatch(Action::CaptureFailed("one".into()));
        session.dispatch(Action::CaptureFailed("two".into()));

        let first = effects.try_recv().expect("first");
        let second = effects.try_recv().expect("second");
        assert!(matches!(first, SideEffect::Message(m) if m.contains("one")));
        assert!(matches!(second, SideEffect::Message(m) if m.contains("two")));
    }

    #[test]
    fn test_measure_center_only_once() {
        let mut session = session();
        let id = add_image(&mut session);
        session.measure_element_center(&id, Vec2::new(300.0, 300.0));
        session.measure_element_center(&id, Vec2::new(1.0, 1.0));
        let center = session.element(&id).expect("element").transform.center_offset;
        assert_eq!(center, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_release_over_delete_zone_deletes_once() {
        let mut session = session();
        let id = add_image(&mut session);
        session.measure_element_center(&id, Vec2::new(500.0, 1400.0));

        session.set_transform_in_progress(&id, true);
        let step = session
            .gesture_frame(&id, &GestureFrame::pan(0.0, 95.0))
            .expect("step");
        assert!(step.inside_delete_zone);
        assert!(session.guides().delete_zone_hot);
        assert!(session.guides().near_vertical_center);

        session.set_transform_in_progress(&id, false);
        assert!(session.element(&id).is_none());
        assert!(session.state().elements.is_empty());
        assert_eq!(session.guides(), GuideState::default());
        // Already gone.
        session.set_transform_in_progress(&id, false);
        assert!(session.gesture_frame(&id, &GestureFrame::pan(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_release_elsewhere_keeps_element() {
        let mut session = session();
        let id = add_image(&mut session);
        session.measure_element_center(&id, Vec2::new(200.0, 200.0));
        session.set_transform_in_progress(&id, true);
        let _ = session.gesture_frame(&id, &GestureFrame::pan(10.0, 10.0));
        session.set_transform_in_progress(&id, false);
        assert!(session.element(&id).is_some());
    }

    #[test]
    fn test_prepare_export_without_photo_releases_flag() {
        let mut session = session();
        let mut effects = session.take_effects().expect("receiver");
        assert!(session.prepare_export().is_none());
        assert!(!session.state().is_exporting);
        assert!(matches!(effects.try_recv(), Ok(SideEffect::Message(_))));
    }

    #[test]
    fn test_prepare_export_once() {
        let mut session = session();
        session.dispatch(capture());
        let _ = add_image(&mut session);

        let request = session.prepare_export().expect("request");
        assert_eq!(request.elements.len(), 1);
        assert_eq!(request.folder_name, crate::config::DEFAULT_FOLDER_NAME);
        assert!(session.state().is_exporting);
        assert!(session.prepare_export().is_none());
    }

    #[test]
    fn test_pump_applies_completions() {
        let mut session = session();
        session.dispatch(capture());
        let _ = session.prepare_export().expect("request");

        let sender = session.completion_sender();
        sender
            .send(Action::ExportCompleted("file:///tmp/1.png".into()))
            .expect("send");
        assert_eq!(session.pump(), 1);
        assert!(!session.state().is_exporting);
        assert_eq!(session.state().last_export_ref.as_deref(), Some("file:///tmp/1.png"));
    }

    #[tokio::test]
    async fn test_next_completion_waits() {
        let mut session = session();
        session.dispatch(capture());
        let _ = session.prepare_export().expect("request");

        let sender = session.completion_sender();
        tokio::spawn(async move {
            let _ = sender.send(Action::ExportFailed("offline".into()));
        });
        assert!(session.next_completion().await);
        assert!(!session.state().is_exporting);
        assert!(session.state().is_photo_taken());
    }
}
