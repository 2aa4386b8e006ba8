//! Session configuration.
//!
//! Set once when a session starts and read-only afterwards. Loaded from JSON or
//! built in code; either way it is handed to [`crate::Session::new`].

use serde::{Deserialize, Serialize};

use crate::background::BackgroundItem;
use crate::error::{CoreError, CoreResult};
use crate::persistence::resolve_folder;
use crate::resource::{ColorRef, FontRef};

/// Folder used when the configured folder name is empty.
pub const DEFAULT_FOLDER_NAME: &str = "PhotoOverlay";

/// A typeface offered in the text editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontOption {
    /// Sample text shown on the picker.
    #[serde(default = "default_font_label")]
    pub label: String,
    /// Typeface, or `None` for the host default.
    #[serde(default)]
    pub font: Option<FontRef>,
}

fn default_font_label() -> String {
    "ABC".to_string()
}

impl FontOption {
    /// A picker entry for `font`.
    #[must_use]
    pub fn new(font: Option<FontRef>) -> Self {
        Self {
            label: default_font_label(),
            font,
        }
    }
}

/// Fixed gesture thresholds, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Half-width of the window around the scene center that snaps an axis.
    pub snap_tolerance: f32,
    /// Proximity radius that counts as "inside the delete zone".
    pub delete_radius: f32,
    /// Scale forced while hovering the delete zone.
    pub delete_shrink_scale: f32,
    /// Lower bound of the rendered scale.
    pub min_display_scale: f32,
    /// Upper bound of the rendered scale.
    pub max_display_scale: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            snap_tolerance: 40.0,
            delete_radius: 28.0,
            delete_shrink_scale: 0.5,
            min_display_scale: 0.5,
            max_display_scale: 5.0,
        }
    }
}

/// Output canvas and intrinsic element sizes, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Composite width.
    pub canvas_width: u32,
    /// Composite height.
    pub canvas_height: u32,
    /// Font size of text elements.
    pub text_size: f32,
    /// Width of image elements; height follows the aspect ratio.
    pub image_element_width: f32,
    /// Font size of text decorations that leave `text_size` at 0.
    pub background_text_size: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas_width: 1080,
            canvas_height: 1440,
            text_size: 48.0,
            image_element_width: 180.0,
            background_text_size: 24.0,
        }
    }
}

/// Everything a session needs to know up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage folder for exports; empty means [`DEFAULT_FOLDER_NAME`].
    pub folder_name: String,
    /// Configured decorations, without the blank entry.
    pub background_items: Vec<BackgroundItem>,
    /// Typefaces offered in the text editor.
    pub fonts: Vec<FontOption>,
    /// Colors offered in the text editor.
    pub colors: Vec<ColorRef>,
    /// Gesture thresholds.
    pub gesture: GestureTuning,
    /// Composite sizes.
    pub render: RenderSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            folder_name: String::new(),
            background_items: Vec::new(),
            fonts: vec![FontOption::new(None)],
            colors: default_palette(),
            gesture: GestureTuning::default(),
            render: RenderSettings::default(),
        }
    }
}

/// The eleven text colors offered by default, white first.
#[must_use]
pub fn default_palette() -> Vec<ColorRef> {
    vec![
        ColorRef::WHITE,
        ColorRef::BLACK,
        ColorRef::rgb(0x00, 0x00, 0xFF),
        ColorRef::rgb(0xBB, 0x86, 0xFC),
        ColorRef::rgb(0x03, 0xDA, 0xC5),
        ColorRef::rgb(0x01, 0x87, 0x86),
        ColorRef::rgb(0x62, 0x00, 0xEE),
        ColorRef::rgb(0xFF, 0x00, 0x00),
        ColorRef::rgb(0xFF, 0xA5, 0x00),
        ColorRef::rgb(0x87, 0xCE, 0xEB),
        ColorRef::rgb(0xFF, 0xFF, 0x00),
    ]
}

impl SessionConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails [`Self::validate`].
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(CoreError::Serialization)
    }

    /// Set the export folder.
    #[must_use]
    pub fn with_folder_name(mut self, folder_name: impl Into<String>) -> Self {
        self.folder_name = folder_name.into();
        self
    }

    /// Set the configured decorations.
    #[must_use]
    pub fn with_background_items(mut self, items: Vec<BackgroundItem>) -> Self {
        self.background_items = items;
        self
    }

    /// Set the font picker entries.
    #[must_use]
    pub fn with_fonts(mut self, fonts: Vec<FontOption>) -> Self {
        self.fonts = fonts;
        self
    }

    /// Set the composite canvas size.
    #[must_use]
    pub fn with_canvas_size(mut self, width: u32, height: u32) -> Self {
        self.render.canvas_width = width;
        self.render.canvas_height = height;
        self
    }

    /// Set the gesture thresholds.
    #[must_use]
    pub fn with_gesture_tuning(mut self, tuning: GestureTuning) -> Self {
        self.gesture = tuning;
        self
    }

    /// The export folder, falling back to [`DEFAULT_FOLDER_NAME`].
    #[must_use]
    pub fn effective_folder_name(&self) -> &str {
        resolve_folder(&self.folder_name)
    }

    /// Check that sizes and thresholds are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        let render = &self.render;
        if render.canvas_width == 0 || render.canvas_height == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "canvas size must be positive, got {}x{}",
                render.canvas_width, render.canvas_height
            )));
        }
        if render.text_size <= 0.0 || render.image_element_width <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "element sizes must be positive".to_string(),
            ));
        }

        let g = &self.gesture;
        let thresholds = [
            ("snap_tolerance", g.snap_tolerance),
            ("delete_radius", g.delete_radius),
            ("delete_shrink_scale", g.delete_shrink_scale),
            ("min_display_scale", g.min_display_scale),
            ("max_display_scale", g.max_display_scale),
        ];
        if let Some((name, value)) = thresholds
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(CoreError::InvalidConfig(format!(
                "{name} must be a non-negative number, got {value}"
            )));
        }
        if g.min_display_scale > g.max_display_scale {
            return Err(CoreError::InvalidConfig(format!(
                "min_display_scale {} exceeds max_display_scale {}",
                g.min_display_scale, g.max_display_scale
            )));
        }
        Ok(())
    }
}
