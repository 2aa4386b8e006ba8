//! Opaque resource handles.
//!
//! The core never resolves these to pixels or glyphs; the renderer and the host
//! do. Handles are cheap to clone and compare.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Handle to image content: a file path, a `file://` or `data:` URI, or any
/// host-specific identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a source string.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// The raw source string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a renderable typeface (family name or font file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontRef(String);

impl FontRef {
    /// Wrap a font identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FontRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An RGBA color. Serialized as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorRef {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl ColorRef {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);

    /// Create an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Create a color with alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// The channels as an array.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] if the string is not 6 or 8 hex digits.
    pub fn from_hex(hex: &str) -> CoreResult<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(CoreError::InvalidColor(hex.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CoreError::InvalidColor(hex.to_string()))
        };

        let a = if digits.len() == 8 { channel(6)? } else { 0xFF };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Format as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for ColorRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ColorRef> for String {
    fn from(color: ColorRef) -> Self {
        color.to_hex()
    }
}

/// Immutable handle to a flattened RGBA8 pixel buffer.
///
/// Cloning shares the buffer.
#[derive(Clone)]
pub struct RasterHandle {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl RasterHandle {
    /// Wrap straight (non-premultiplied) RGBA8 pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRaster`] if the buffer length does not equal
    /// `width * height * 4` or either dimension is zero.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> CoreResult<Self> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if width == 0 || height == 0 || pixels.len() as u64 != expected {
            return Err(CoreError::InvalidRaster(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// A raster filled with one color. Zero dimensions are bumped to 1.
    #[must_use]
    pub fn solid(width: u32, height: u32, color: ColorRef) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let pixels: Vec<u8> = std::iter::repeat(color.to_array())
            .take(width as usize * height as usize)
            .flatten()
            .collect();
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The RGBA value at `(x, y)`, if inside the raster.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels
            .get(i..i + 4)
            .and_then(|p| <[u8; 4]>::try_from(p).ok())
    }

    /// Whether both handles share the same buffer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl PartialEq for RasterHandle {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && (self.ptr_eq(other) || self.pixels == other.pixels)
    }
}

impl fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterHandle")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let c = ColorRef::from_hex("#87CEEB").expect("parse");
        assert_eq!(c, ColorRef::rgb(0x87, 0xCE, 0xEB));
        assert_eq!(c.to_hex(), "#87CEEB");

        let translucent = ColorRef::from_hex("00000080").expect("parse");
        assert_eq!(translucent.a, 0x80);
        assert_eq!(translucent.to_hex(), "#00000080");
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert!(ColorRef::from_hex("#12345").is_err());
        assert!(ColorRef::from_hex("#GGGGGG").is_err());
        assert!(ColorRef::from_hex("#ééé").is_err());
    }

    #[test]
    fn test_color_serde_as_string() {
        let json = serde_json::to_string(&ColorRef::WHITE).expect("serialize");
        assert_eq!(json, "\"#FFFFFF\"");
        let back: ColorRef = serde_json::from_str("\"#ff0000\"").expect("deserialize");
        assert_eq!(back, ColorRef::rgb(255, 0, 0));
    }

    #[test]
    fn test_raster_dimension_check() {
        assert!(RasterHandle::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(RasterHandle::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(RasterHandle::from_rgba(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_raster_pixel_lookup() {
        let raster = RasterHandle::solid(3, 2, ColorRef::rgb(1, 2, 3));
        assert_eq!(raster.pixel(2, 1), Some([1, 2, 3, 255]));
        assert_eq!(raster.pixel(3, 0), None);
    }

    #[test]
    fn test_raster_equality_shares_buffer() {
        let a = RasterHandle::solid(4, 4, ColorRef::BLACK);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a, RasterHandle::solid(4, 4, ColorRef::BLACK));
        assert_ne!(a, RasterHandle::solid(4, 4, ColorRef::WHITE));
    }
}
