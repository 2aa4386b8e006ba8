//! Background decorations selectable before a photo is taken.
//!
//! Items are fixed for the whole session; only the selection changes.

use serde::{Deserialize, Serialize};

use crate::element::TextAlign;
use crate::resource::{ColorRef, FontRef, ImageRef};

/// Position on the 9-point anchor grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// Top-left.
    TopStart,
    /// Top, horizontally centered.
    TopCenter,
    /// Top-right.
    TopEnd,
    /// Left, vertically centered.
    CenterStart,
    /// Dead center.
    #[default]
    Center,
    /// Right, vertically centered.
    CenterEnd,
    /// Bottom-left.
    BottomStart,
    /// Bottom, horizontally centered.
    BottomCenter,
    /// Bottom-right.
    BottomEnd,
}

impl Anchor {
    /// Map the integer codes 0..=8 (row-major from top-left). Unknown codes center.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::TopStart,
            1 => Self::TopCenter,
            2 => Self::TopEnd,
            3 => Self::CenterStart,
            5 => Self::CenterEnd,
            6 => Self::BottomStart,
            7 => Self::BottomCenter,
            8 => Self::BottomEnd,
            _ => Self::Center,
        }
    }

    /// Fractional position along each axis: 0.0 start, 0.5 center, 1.0 end.
    #[must_use]
    pub const fn fractions(self) -> (f32, f32) {
        match self {
            Self::TopStart => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopEnd => (1.0, 0.0),
            Self::CenterStart => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterEnd => (1.0, 0.5),
            Self::BottomStart => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomEnd => (1.0, 1.0),
        }
    }
}

/// Inner spacing around a decoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    /// Leading edge.
    pub start: f32,
    /// Trailing edge.
    pub end: f32,
    /// Top edge.
    pub top: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Padding {
    /// Same padding on every side.
    #[must_use]
    pub const fn uniform(value: f32) -> Self {
        Self {
            start: value,
            end: value,
            top: value,
            bottom: value,
        }
    }
}

/// Placement of a decoration inside the preview area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Grid anchor.
    pub anchor: Anchor,
    /// Width in logical units, 0 for intrinsic.
    pub width: f32,
    /// Height in logical units, 0 for intrinsic.
    pub height: f32,
    /// Stretch to the whole area (minus padding).
    pub fill_parent: bool,
    /// Spacing from the area edges.
    pub padding: Padding,
    /// Whether this item is the active decoration.
    pub selected: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            anchor: Anchor::Center,
            width: 0.0,
            height: 0.0,
            fill_parent: false,
            padding: Padding::default(),
            selected: false,
        }
    }
}

/// A fixed decoration drawn over the camera preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackgroundItem {
    /// An image decoration. `None` is the blank "no decoration" entry.
    Image {
        /// Image source.
        #[serde(default)]
        image: Option<ImageRef>,
        /// Placement.
        #[serde(default)]
        layout: Layout,
    },

    /// A text decoration.
    Text {
        /// Text content.
        text: String,
        /// Typeface, or `None` for the host default.
        #[serde(default)]
        font: Option<FontRef>,
        /// Text color.
        #[serde(default = "default_text_color")]
        color: ColorRef,
        /// Font size in logical units, 0 for the renderer default.
        #[serde(default)]
        text_size: f32,
        /// Alignment of lines within the text block.
        #[serde(default)]
        text_align: TextAlign,
        /// Draw a translucent panel behind the text.
        #[serde(default)]
        show_background_panel: bool,
        /// Placement.
        #[serde(default)]
        layout: Layout,
    },
}

fn default_text_color() -> ColorRef {
    ColorRef::WHITE
}

impl BackgroundItem {
    /// The blank entry that means "no decoration".
    #[must_use]
    pub fn blank() -> Self {
        Self::Image {
            image: None,
            layout: Layout::default(),
        }
    }

    /// An image decoration with default layout.
    #[must_use]
    pub fn image(image: ImageRef) -> Self {
        Self::Image {
            image: Some(image),
            layout: Layout::default(),
        }
    }

    /// A text decoration with default styling and layout.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            font: None,
            color: ColorRef::WHITE,
            text_size: 0.0,
            text_align: TextAlign::Center,
            show_background_panel: false,
            layout: Layout::default(),
        }
    }

    /// Placement of this item.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        match self {
            Self::Image { layout, .. } | Self::Text { layout, .. } => layout,
        }
    }

    fn layout_mut(&mut self) -> &mut Layout {
        match self {
            Self::Image { layout, .. } | Self::Text { layout, .. } => layout,
        }
    }

    /// Whether this item is the active decoration.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.layout().selected
    }

    /// Whether this item draws nothing.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Image { image: None, .. })
    }

    /// Set the anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.layout_mut().anchor = anchor;
        self
    }

    /// Set a fixed size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        let layout = self.layout_mut();
        layout.width = width;
        layout.height = height;
        self
    }

    /// Stretch to the whole preview area.
    #[must_use]
    pub fn with_fill_parent(mut self) -> Self {
        self.layout_mut().fill_parent = true;
        self
    }

    /// Set padding.
    #[must_use]
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.layout_mut().padding = padding;
        self
    }

    /// Set the selection flag.
    #[must_use]
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.layout_mut().selected = selected;
        self
    }

    /// Set text styling. No effect on image items.
    #[must_use]
    pub fn with_text_style(
        mut self,
        new_color: ColorRef,
        new_size: f32,
        new_align: TextAlign,
    ) -> Self {
        if let Self::Text {
            color,
            text_size,
            text_align,
            ..
        } = &mut self
        {
            *color = new_color;
            *text_size = new_size;
            *text_align = new_align;
        }
        self
    }

    /// Set the typeface. No effect on image items.
    #[must_use]
    pub fn with_font(mut self, new_font: FontRef) -> Self {
        if let Self::Text { font, .. } = &mut self {
            *font = Some(new_font);
        }
        self
    }

    /// Draw a translucent panel behind the text. No effect on image items.
    #[must_use]
    pub fn with_background_panel(mut self) -> Self {
        if let Self::Text {
            show_background_panel,
            ..
        } = &mut self
        {
            *show_background_panel = true;
        }
        self
    }
}

/// Mark `index` as the only selected item. Out-of-range indices change nothing
/// and return `false`.
pub fn select_exclusive(items: &mut [BackgroundItem], index: usize) -> bool {
    if index >= items.len() {
        return false;
    }
    for (i, item) in items.iter_mut().enumerate() {
        item.layout_mut().selected = i == index;
    }
    true
}

/// Build the session's background list from configured items.
///
/// A non-empty list gets the blank entry prepended so index 0 means "no
/// decoration". The first entry is selected and all others are cleared.
#[must_use]
pub fn session_items(configured: &[BackgroundItem]) -> Vec<BackgroundItem> {
    if configured.is_empty() {
        return Vec::new();
    }
    let mut items = Vec::with_capacity(configured.len() + 1);
    items.push(BackgroundItem::blank());
    items.extend(configured.iter().cloned());
    select_exclusive(&mut items, 0);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<BackgroundItem> {
        vec![
            BackgroundItem::image(ImageRef::new("frame.png")).with_fill_parent(),
            BackgroundItem::text("Hello")
                .with_anchor(Anchor::BottomCenter)
                .with_background_panel(),
        ]
    }

    #[test]
    fn test_session_items_prepend_blank() {
        let items = session_items(&sample());
        assert_eq!(items.len(), 3);
        assert!(items[0].is_blank());
        assert!(items[0].is_selected());
        assert!(!items[1].is_selected());
        assert!(!items[2].is_selected());
    }

    #[test]
    fn test_session_items_empty_stays_empty() {
        assert!(session_items(&[]).is_empty());
    }

    #[test]
    fn test_select_exclusive() {
        let mut items = session_items(&sample());
        assert!(select_exclusive(&mut items, 2));
        let selected: Vec<_> = items.iter().map(BackgroundItem::is_selected).collect();
        assert_eq!(selected, vec![false, false, true]);

        assert!(!select_exclusive(&mut items, 9));
        assert!(items[2].is_selected());
    }

    #[test]
    fn test_builders_are_variant_aware() {
        let image = BackgroundItem::image(ImageRef::new("x.png")).with_background_panel();
        assert!(matches!(image, BackgroundItem::Image { .. }));

        let text =
            BackgroundItem::text("t").with_text_style(ColorRef::BLACK, 24.0, TextAlign::Right);
        match text {
            BackgroundItem::Text {
                color,
                text_size,
                text_align,
                ..
            } => {
                assert_eq!(color, ColorRef::BLACK);
                assert!((text_size - 24.0).abs() < f32::EPSILON);
                assert_eq!(text_align, TextAlign::Right);
            }
            BackgroundItem::Image { .. } => panic!("expected text item"),
        }
    }

    #[test]
    fn test_anchor_codes() {
        assert_eq!(Anchor::from_code(0), Anchor::TopStart);
        assert_eq!(Anchor::from_code(4), Anchor::Center);
        assert_eq!(Anchor::from_code(8), Anchor::BottomEnd);
        assert_eq!(Anchor::from_code(-1), Anchor::Center);
    }

    #[test]
    fn test_deserialize_minimal_text_item() {
        let item: BackgroundItem =
            serde_json::from_str(r#"{"type":"text","text":"Summer"}"#).expect("deserialize");
        assert!(matches!(item, BackgroundItem::Text { color, .. } if color == ColorRef::WHITE));
        assert_eq!(item.layout().anchor, Anchor::Center);
    }
}
