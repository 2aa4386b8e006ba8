//! Scene and editing state.
//!
//! Both are plain values. The reducer takes them by reference and returns new
//! ones; nothing else mutates them.

use serde::{Deserialize, Serialize};

use crate::background::{session_items, BackgroundItem};
use crate::config::SessionConfig;
use crate::element::{Element, ElementId, ElementKind, TextAlign};
use crate::resource::{ColorRef, FontRef, RasterHandle};
use crate::store::ElementStore;

/// Everything that describes the scene being composed.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    /// Decorations, blank entry first when any are configured.
    pub background_items: Vec<BackgroundItem>,
    /// Index of the selected decoration.
    pub current_background_index: usize,
    /// Overlay elements in z-order.
    pub elements: ElementStore,
    /// The captured camera frame.
    pub captured_frame: Option<RasterHandle>,
    /// The background decoration rendered at capture time.
    pub composited_background: Option<RasterHandle>,
    /// An export is in flight.
    pub is_exporting: bool,
    /// Reference of the most recent successful export.
    pub last_export_ref: Option<String>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            background_items: Vec::new(),
            current_background_index: 0,
            elements: ElementStore::new(),
            captured_frame: None,
            composited_background: None,
            is_exporting: false,
            last_export_ref: None,
        }
    }
}

impl SceneState {
    /// Initial state for a session.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            background_items: session_items(&config.background_items),
            ..Self::default()
        }
    }

    /// Whether a photo has been captured.
    ///
    /// The frame and its composited background are always set together.
    #[must_use]
    pub const fn is_photo_taken(&self) -> bool {
        self.captured_frame.is_some() && self.composited_background.is_some()
    }

    /// The selected decoration, if any.
    #[must_use]
    pub fn selected_background(&self) -> Option<&BackgroundItem> {
        self.background_items.get(self.current_background_index)
    }
}

/// Transient state of the text editor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingState {
    /// Element being edited; `None` creates a new one on commit.
    pub target_id: Option<ElementId>,
    /// Current text.
    pub text: String,
    /// Selected font palette entry.
    pub selected_font_index: Option<usize>,
    /// Selected color palette entry.
    pub selected_color_index: Option<usize>,
    /// Selected entry of [`TextAlign::CYCLE`].
    pub selected_alignment_index: Option<usize>,
}

fn first_index(len: usize) -> Option<usize> {
    (len > 0).then_some(0)
}

impl EditingState {
    /// Fresh editor state: empty text, first entry of each palette.
    #[must_use]
    pub fn defaults_for(config: &SessionConfig) -> Self {
        Self {
            target_id: None,
            text: String::new(),
            selected_font_index: first_index(config.fonts.len()),
            selected_color_index: first_index(config.colors.len()),
            selected_alignment_index: first_index(TextAlign::CYCLE.len()),
        }
    }

    /// Editor state for `element`, pre-populated when it is a text element.
    ///
    /// Styles missing from the palettes leave that selection empty.
    #[must_use]
    pub fn for_element(config: &SessionConfig, element: &Element) -> Self {
        let mut editing = Self::defaults_for(config);
        editing.target_id = Some(element.id.clone());
        if let ElementKind::Text {
            text,
            font,
            color,
            align,
        } = &element.kind
        {
            editing.text.clone_from(text);
            editing.selected_font_index = config.fonts.iter().position(|f| &f.font == font);
            editing.selected_color_index = config.colors.iter().position(|c| c == color);
            editing.selected_alignment_index = TextAlign::CYCLE.iter().position(|a| a == align);
        }
        editing
    }

    /// Set the target element.
    #[must_use]
    pub fn with_target(mut self, id: ElementId) -> Self {
        self.target_id = Some(id);
        self
    }

    /// Set the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// The selected typeface.
    #[must_use]
    pub fn font(&self, config: &SessionConfig) -> Option<FontRef> {
        self.selected_font_index
            .and_then(|i| config.fonts.get(i))
            .and_then(|option| option.font.clone())
    }

    /// The selected color, white when nothing is selected.
    #[must_use]
    pub fn color(&self, config: &SessionConfig) -> ColorRef {
        self.selected_color_index
            .and_then(|i| config.colors.get(i).copied())
            .unwrap_or(ColorRef::WHITE)
    }

    /// The selected alignment, centered when nothing is selected.
    #[must_use]
    pub fn align(&self) -> TextAlign {
        self.selected_alignment_index
            .and_then(|i| TextAlign::CYCLE.get(i).copied())
            .unwrap_or_default()
    }

    /// The element content this state commits to.
    #[must_use]
    pub fn to_kind(&self, config: &SessionConfig) -> ElementKind {
        ElementKind::Text {
            text: self.text.clone(),
            font: self.font(config),
            color: self.color(config),
            align: self.align(),
        }
    }
}
