//! Overlay elements - the movable text and image units placed over a photo.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Vec2;
use crate::resource::{ColorRef, FontRef, ImageRef};

/// Unique identifier for an element.
///
/// Assigned once at creation and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Align to the leading edge.
    Left,
    /// Center the text.
    #[default]
    Center,
    /// Align to the trailing edge.
    Right,
}

impl TextAlign {
    /// Alignment choices in the order offered to the user; cycling walks this list.
    pub const CYCLE: [Self; 3] = [Self::Center, Self::Left, Self::Right];

    /// Map the integer codes used by host configuration (0 start, 1 end, 2 center).
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Left,
            1 => Self::Right,
            _ => Self::Center,
        }
    }
}

/// Scale, rotation and placement of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Cumulative gesture scale factor.
    pub prev_scale: f32,
    /// Stored scale. Not clamped; only the rendered scale is.
    pub scale: f32,
    /// Rotation in degrees. Unbounded.
    pub rotation: f32,
    /// Live on-screen center of the element, zero until first measured.
    pub center_offset: Vec2,
    /// Translation from the scene center.
    pub offset: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            prev_scale: 1.0,
            scale: 1.0,
            rotation: 0.0,
            center_offset: Vec2::ZERO,
            offset: Vec2::ZERO,
        }
    }
}

/// The content an element carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text label.
    Text {
        /// Text content.
        text: String,
        /// Typeface, or `None` for the host default.
        font: Option<FontRef>,
        /// Fill color.
        color: ColorRef,
        /// Horizontal alignment.
        align: TextAlign,
    },

    /// A picked image.
    Image {
        /// Image source.
        image: ImageRef,
    },
}

impl ElementKind {
    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
        }
    }
}

/// An overlay element with content and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Element content.
    pub kind: ElementKind,
    /// Scale, rotation and placement.
    pub transform: Transform,
}

impl Element {
    /// Create a new element with a fresh id and the default transform.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            transform: Transform::default(),
        }
    }

    /// Create a text element.
    #[must_use]
    pub fn text(
        text: impl Into<String>,
        font: Option<FontRef>,
        color: ColorRef,
        align: TextAlign,
    ) -> Self {
        Self::new(ElementKind::Text {
            text: text.into(),
            font,
            color,
            align,
        })
    }

    /// Create an image element.
    #[must_use]
    pub fn image(image: ImageRef) -> Self {
        Self::new(ElementKind::Image { image })
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Whether this is a text element.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Element::image(ImageRef::new("a.png"));
        let b = Element::image(ImageRef::new("a.png"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_default_transform() {
        let t = Transform::default();
        assert!((t.scale - 1.0).abs() < f32::EPSILON);
        assert!((t.prev_scale - 1.0).abs() < f32::EPSILON);
        assert!(t.rotation.abs() < f32::EPSILON);
        assert!(t.offset.is_zero());
        assert!(t.center_offset.is_zero());
    }

    #[test]
    fn test_align_codes() {
        assert_eq!(TextAlign::from_code(0), TextAlign::Left);
        assert_eq!(TextAlign::from_code(1), TextAlign::Right);
        assert_eq!(TextAlign::from_code(2), TextAlign::Center);
        assert_eq!(TextAlign::from_code(42), TextAlign::Center);
    }

    #[test]
    fn test_kind_serializes_tagged() {
        let element = Element::text("Hi", None, ColorRef::WHITE, TextAlign::Left);
        let json = serde_json::to_value(&element.kind).expect("serialize");
        assert_eq!(json["type"], "text");
        assert_eq!(json["align"], "left");
        assert_eq!(json["color"], "#FFFFFF");
    }
}
