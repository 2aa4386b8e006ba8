//! Vector math used by the gesture engine.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Distance reported for a point that has not been measured yet.
///
/// Keeps unmeasured element centers from ever registering as close to the
/// delete zone before layout has stabilized.
pub const UNMEASURED_DISTANCE: f32 = 1000.0;

/// A 2D vector in logical screen units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector, also used as the "not yet measured" marker.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both components are exactly zero.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Rotate `v` by `degrees` around the origin.
#[must_use]
pub fn rotate(v: Vec2, degrees: f32) -> Vec2 {
    let radians = f64::from(degrees).to_radians();
    let (sin, cos) = radians.sin_cos();
    let (x, y) = (f64::from(v.x), f64::from(v.y));

    #[allow(clippy::cast_possible_truncation)]
    Vec2::new((x * cos - y * sin) as f32, (x * sin + y * cos) as f32)
}

/// Distance between `a` and `b`.
///
/// Returns [`UNMEASURED_DISTANCE`] when `a` is the zero vector.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    if a.is_zero() {
        UNMEASURED_DISTANCE
    } else {
        (b - a).length()
    }
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f32::clamp`] this never panics when the bounds are inverted; the
/// lower bound wins.
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

/// Whether `value` lies in the inclusive window `target ± tolerance`, with
/// `target` snapped to the nearest whole unit.
#[must_use]
pub fn within(value: f32, target: f32, tolerance: f32) -> bool {
    let anchor = target.round();
    value >= anchor - tolerance && value <= anchor + tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), 90.0);
        assert!(approx(v, Vec2::new(0.0, 1.0)), "got {v:?}");
    }

    #[test]
    fn test_rotate_half_turn() {
        let v = rotate(Vec2::new(3.0, -2.0), 180.0);
        assert!(approx(v, Vec2::new(-3.0, 2.0)), "got {v:?}");
    }

    #[test]
    fn test_rotate_wraps_full_turns() {
        let a = rotate(Vec2::new(5.0, 7.0), 30.0);
        let b = rotate(Vec2::new(5.0, 7.0), 30.0 + 720.0);
        assert!(approx(a, b));
    }

    #[test]
    fn test_distance_sentinel() {
        assert!((distance(Vec2::ZERO, Vec2::new(3.0, 4.0)) - 1000.0).abs() < f32::EPSILON);
        assert!((distance(Vec2::ZERO, Vec2::ZERO) - 1000.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_distance_only_first_argument_is_guarded() {
        let d = distance(Vec2::new(3.0, 4.0), Vec2::ZERO);
        assert!((d - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_within_rounds_target() {
        assert!(within(140.0, 100.4, 40.0));
        assert!(!within(140.6, 100.4, 40.0));
        assert!(within(60.0, 100.0, 40.0));
    }

    #[test]
    fn test_clamp_inverted_bounds() {
        assert!((clamp(3.0, 5.0, 1.0) - 5.0).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_distance_from_zero_is_sentinel(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4) {
            prop_assert_eq!(distance(Vec2::ZERO, Vec2::new(x, y)), UNMEASURED_DISTANCE);
        }

        #[test]
        fn prop_distance_to_self_is_zero(x in -1.0e4f32..1.0e4, y in -1.0e4f32..1.0e4) {
            let a = Vec2::new(x, y);
            prop_assume!(!a.is_zero());
            prop_assert_eq!(distance(a, a), 0.0);
        }

        #[test]
        fn prop_rotate_preserves_length(
            x in -100.0f32..100.0,
            y in -100.0f32..100.0,
            deg in -720.0f32..720.0,
        ) {
            let v = Vec2::new(x, y);
            prop_assert!((rotate(v, deg).length() - v.length()).abs() < 1e-3);
        }
    }
}
