//! # Gesture Transform Engine
//!
//! Turns per-frame multi-touch deltas into element transforms.
//!
//! ```text
//! frame (scale_change, pan_delta, rotation_change)
//!        │
//!        ▼
//!  ┌───────────┐   prev-frame delete flag   ┌──────────────┐
//!  │   step    │ ◄───────────────────────── │GestureTracker│
//!  └─────┬─────┘ ─────────────────────────► └──────┬───────┘
//!        │  new transform + guide signals          │ release edge
//!        ▼                                         ▼
//!  Action::UpdateTransform               Action::DeleteElement
//! ```
//!
//! The engine never owns elements. It reads a transform, returns a new one, and
//! the session feeds that back through the reducer.

use crate::config::GestureTuning;
use crate::element::{ElementId, Transform};
use crate::geometry::{clamp, distance, rotate, within, Vec2};

/// One frame of an active multi-touch gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureFrame {
    /// Multiplicative zoom since the last frame (1.0 = none).
    pub scale_change: f32,
    /// Pointer translation since the last frame, in element-local units.
    pub pan_delta: Vec2,
    /// Rotation since the last frame, in degrees.
    pub rotation_change: f32,
}

impl Default for GestureFrame {
    fn default() -> Self {
        Self {
            scale_change: 1.0,
            pan_delta: Vec2::ZERO,
            rotation_change: 0.0,
        }
    }
}

impl GestureFrame {
    /// A pure drag.
    #[must_use]
    pub fn pan(dx: f32, dy: f32) -> Self {
        Self {
            pan_delta: Vec2::new(dx, dy),
            ..Self::default()
        }
    }

    /// A pure pinch.
    #[must_use]
    pub fn pinch(scale_change: f32) -> Self {
        Self {
            scale_change,
            ..Self::default()
        }
    }

    /// A pure twist.
    #[must_use]
    pub fn twist(degrees: f32) -> Self {
        Self {
            rotation_change: degrees,
            ..Self::default()
        }
    }
}

/// Scene geometry the engine measures against.
///
/// Both points start at zero and are filled in by the host once layout is known.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureContext {
    /// Geometric center of the editing area.
    pub scene_center: Vec2,
    /// Center of the on-screen delete target.
    pub delete_zone_center: Vec2,
}

/// Result of applying one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStep {
    /// The updated transform.
    pub transform: Transform,
    /// Center x is within the snap window of the scene center.
    pub near_vertical_center: bool,
    /// Center y is within the snap window of the scene center.
    pub near_horizontal_center: bool,
    /// Center is within the delete radius.
    pub inside_delete_zone: bool,
}

/// Whether `center` counts as inside the delete zone.
///
/// An unmeasured (zero) center never does.
#[must_use]
pub fn is_inside_delete_zone(center: Vec2, ctx: &GestureContext, tuning: &GestureTuning) -> bool {
    distance(center, ctx.delete_zone_center) <= tuning.delete_radius
}

/// The scale an element is drawn at. The stored scale is left untouched.
#[must_use]
pub fn rendered_scale(scale: f32, tuning: &GestureTuning) -> f32 {
    clamp(scale, tuning.min_display_scale, tuning.max_display_scale)
}

/// Apply one gesture frame to `current`.
///
/// `was_inside_delete_zone` is the flag computed on the previous frame; using
/// it here instead of the fresh one keeps the shrink cue from oscillating.
#[must_use]
pub fn step(
    current: &Transform,
    was_inside_delete_zone: bool,
    frame: &GestureFrame,
    ctx: &GestureContext,
    tuning: &GestureTuning,
) -> GestureStep {
    let mut t = *current;

    t.prev_scale *= frame.scale_change;
    t.scale = if was_inside_delete_zone {
        tuning.delete_shrink_scale
    } else {
        t.prev_scale * frame.scale_change
    };
    t.rotation += frame.rotation_change;

    let rotated_pan = rotate(frame.pan_delta * t.scale, t.rotation);
    t.offset += rotated_pan;
    t.center_offset += rotated_pan;

    let near_vertical_center =
        within(t.center_offset.x, ctx.scene_center.x, tuning.snap_tolerance);
    let near_horizontal_center =
        within(t.center_offset.y, ctx.scene_center.y, tuning.snap_tolerance);
    if near_vertical_center {
        t.offset.x = 0.0;
    }
    if near_horizontal_center {
        t.offset.y = 0.0;
    }

    GestureStep {
        inside_delete_zone: is_inside_delete_zone(t.center_offset, ctx, tuning),
        transform: t,
        near_vertical_center,
        near_horizontal_center,
    }
}

/// Record the first layout measurement of an element's center.
///
/// Returns the updated transform, or `None` if the center was already known.
#[must_use]
pub fn measured(current: &Transform, center: Vec2) -> Option<Transform> {
    if !current.center_offset.is_zero() || center.is_zero() {
        return None;
    }
    Some(Transform {
        center_offset: center,
        ..*current
    })
}

/// Per-element gesture bookkeeping.
///
/// Holds the flags that live between frames; the transform itself stays in the
/// element store.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTracker {
    id: ElementId,
    in_progress: bool,
    inside_delete_zone: bool,
    near_vertical_center: bool,
    near_horizontal_center: bool,
    center_known: bool,
}

impl GestureTracker {
    /// Start tracking an element.
    #[must_use]
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            in_progress: false,
            inside_delete_zone: false,
            near_vertical_center: false,
            near_horizontal_center: false,
            center_known: false,
        }
    }

    /// The tracked element.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Whether a multi-touch session is active.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Delete-zone flag as of the last frame or refresh.
    #[must_use]
    pub const fn is_inside_delete_zone(&self) -> bool {
        self.inside_delete_zone
    }

    /// Center-guide flags as of the last frame: (vertical, horizontal).
    #[must_use]
    pub const fn near_center(&self) -> (bool, bool) {
        (self.near_vertical_center, self.near_horizontal_center)
    }

    /// Recompute the delete-zone flag from a transform that changed outside a
    /// gesture frame, such as a first center measurement.
    pub fn refresh(&mut self, transform: &Transform, ctx: &GestureContext, tuning: &GestureTuning) {
        self.center_known = !transform.center_offset.is_zero();
        self.inside_delete_zone = is_inside_delete_zone(transform.center_offset, ctx, tuning);
    }

    /// Apply one frame and remember its flags for the next one.
    pub fn apply(
        &mut self,
        transform: &Transform,
        frame: &GestureFrame,
        ctx: &GestureContext,
        tuning: &GestureTuning,
    ) -> GestureStep {
        let result = step(transform, self.inside_delete_zone, frame, ctx, tuning);
        self.inside_delete_zone = result.inside_delete_zone;
        self.near_vertical_center = result.near_vertical_center;
        self.near_horizontal_center = result.near_horizontal_center;
        self.center_known = !result.transform.center_offset.is_zero();
        result
    }

    /// Report whether the multi-touch session is active.
    ///
    /// Only the true → false edge matters: if the element was resting in the
    /// delete zone with a measured center at that instant, its id is returned
    /// so the caller can delete it. Repeated reports of the same value return
    /// `None`.
    pub fn set_in_progress(&mut self, in_progress: bool) -> Option<ElementId> {
        let released = self.in_progress && !in_progress;
        self.in_progress = in_progress;
        if !in_progress {
            self.near_vertical_center = false;
            self.near_horizontal_center = false;
        }

        if released && self.inside_delete_zone && self.center_known {
            tracing::debug!(element = %self.id, "gesture released inside delete zone");
            Some(self.id.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx() -> GestureContext {
        GestureContext {
            scene_center: Vec2::new(500.0, 800.0),
            delete_zone_center: Vec2::new(500.0, 1500.0),
        }
    }

    fn placed(center: Vec2) -> Transform {
        Transform {
            center_offset: center,
            ..Transform::default()
        }
    }

    #[test]
    fn test_pinch_compounds_on_prev_scale() {
        let tuning = GestureTuning::default();
        let s = step(&Transform::default(), false, &GestureFrame::pinch(2.0), &ctx(), &tuning);
        assert!((s.transform.prev_scale - 2.0).abs() < 1e-6);
        assert!((s.transform.scale - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_delete_zone_forces_shrink_from_previous_frame() {
        let tuning = GestureTuning::default();
        let s = step(&Transform::default(), true, &GestureFrame::pinch(3.0), &ctx(), &tuning);
        assert!((s.transform.scale - 0.5).abs() < 1e-6);
        assert!((s.transform.prev_scale - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_pan_is_scaled_and_rotated() {
        let tuning = GestureTuning::default();
        let start = Transform {
            prev_scale: 2.0,
            scale: 2.0,
            rotation: 90.0,
            center_offset: Vec2::new(100.0, 100.0),
            offset: Vec2::new(-400.0, -700.0),
        };
        // scale_change 1.0 keeps scale = prev_scale = 2.0
        let s = step(&start, false, &GestureFrame::pan(10.0, 0.0), &ctx(), &tuning);
        assert!((s.transform.center_offset.x - 100.0).abs() < 1e-3);
        assert!((s.transform.center_offset.y - 120.0).abs() < 1e-3);
        assert!((s.transform.offset.y - -680.0).abs() < 1e-3);
    }

    #[test]
    fn test_snap_zeroes_offset_axis() {
        let tuning = GestureTuning::default();
        let start = Transform {
            center_offset: Vec2::new(450.0, 300.0),
            offset: Vec2::new(-50.0, -500.0),
            ..Transform::default()
        };
        let s = step(&start, false, &GestureFrame::pan(20.0, 0.0), &ctx(), &tuning);
        assert!(s.near_vertical_center);
        assert!(!s.near_horizontal_center);
        assert!(s.transform.offset.x.abs() < f32::EPSILON);
        assert!((s.transform.offset.y - -500.0).abs() < 1e-3);
        // The measured center keeps moving; only the offset snaps.
        assert!((s.transform.center_offset.x - 470.0).abs() < 1e-3);
    }

    #[test]
    fn test_unmeasured_center_never_inside_delete_zone() {
        let tuning = GestureTuning::default();
        let zone_at_origin = GestureContext {
            scene_center: Vec2::new(500.0, 800.0),
            delete_zone_center: Vec2::new(1.0, 1.0),
        };
        assert!(!is_inside_delete_zone(Vec2::ZERO, &zone_at_origin, &tuning));
    }

    #[test]
    fn test_step_detects_delete_zone() {
        let tuning = GestureTuning::default();
        let start = placed(Vec2::new(500.0, 1460.0));
        let s = step(&start, false, &GestureFrame::pan(0.0, 20.0), &ctx(), &tuning);
        assert!(s.inside_delete_zone, "center {:?}", s.transform.center_offset);
    }

    #[test]
    fn test_measured_only_once() {
        let first = measured(&Transform::default(), Vec2::new(5.0, 6.0)).expect("first measure");
        assert_eq!(first.center_offset, Vec2::new(5.0, 6.0));
        assert!(measured(&first, Vec2::new(9.0, 9.0)).is_none());
        assert!(measured(&Transform::default(), Vec2::ZERO).is_none());
    }

    #[test]
    fn test_release_in_zone_yields_delete_once() {
        let tuning = GestureTuning::default();
        let mut tracker = GestureTracker::new(ElementId::from_string("e1"));
        let start = placed(Vec2::new(500.0, 1440.0));
        tracker.refresh(&start, &ctx(), &tuning);

        assert_eq!(tracker.set_in_progress(true), None);
        let s = tracker.apply(&start, &GestureFrame::pan(0.0, 50.0), &ctx(), &tuning);
        assert!(s.inside_delete_zone);

        assert_eq!(tracker.set_in_progress(false), Some(ElementId::from_string("e1")));
        assert_eq!(tracker.set_in_progress(false), None);
    }

    #[test]
    fn test_release_outside_zone_keeps_element() {
        let tuning = GestureTuning::default();
        let mut tracker = GestureTracker::new(ElementId::from_string("e2"));
        let start = placed(Vec2::new(100.0, 100.0));
        tracker.refresh(&start, &ctx(), &tuning);

        tracker.set_in_progress(true);
        let _ = tracker.apply(&start, &GestureFrame::pan(5.0, 5.0), &ctx(), &tuning);
        assert_eq!(tracker.set_in_progress(false), None);
    }

    #[test]
    fn test_release_without_measured_center_is_ignored() {
        let mut tracker = GestureTracker::new(ElementId::from_string("e3"));
        tracker.set_in_progress(true);
        assert_eq!(tracker.set_in_progress(false), None);
        assert!(!tracker.is_inside_delete_zone());
    }

    proptest! {
        #[test]
        fn prop_rendered_scale_clamps_without_touching_stored(
            changes in proptest::collection::vec(0.2f32..3.0, 1..12)
        ) {
            let tuning = GestureTuning::default();
            let mut t = Transform::default();
            for change in changes {
                t = step(&t, false, &GestureFrame::pinch(change), &ctx(), &tuning).transform;
                let shown = rendered_scale(t.scale, &tuning);
                prop_assert!((0.5..=5.0).contains(&shown));
                prop_assert_eq!(shown, t.scale.clamp(0.5, 5.0));
            }
        }

        #[test]
        fn prop_snap_law(
            cx in 0.0f32..1000.0,
            cy in 0.0f32..1600.0,
            dx in -60.0f32..60.0,
            dy in -60.0f32..60.0,
        ) {
            let tuning = GestureTuning::default();
            let start = Transform {
                center_offset: Vec2::new(cx.max(1.0), cy.max(1.0)),
                offset: Vec2::new(cx - 500.0, cy - 800.0),
                ..Transform::default()
            };
            let s = step(&start, false, &GestureFrame::pan(dx, dy), &ctx(), &tuning);
            let scene = ctx().scene_center;
            if within(s.transform.center_offset.x, scene.x, tuning.snap_tolerance) {
                prop_assert_eq!(s.transform.offset.x, 0.0);
            }
            if within(s.transform.center_offset.y, scene.y, tuning.snap_tolerance) {
                prop_assert_eq!(s.transform.offset.y, 0.0);
            }
        }
    }
}
