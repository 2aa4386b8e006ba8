//! Resource resolution.
//!
//! Turns [`ImageRef`]s into decoded rasters and text into rasterized labels.
//! Images may come from:
//! - plain file paths, absolute or relative to a base directory
//! - `file://` URIs
//! - `data:` URIs, base64 or percent-encoded
//! - rasters registered up front with [`DefaultResolver::with_image`]
//!
//! Text is laid out as SVG and rasterized with resvg.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use base64::Engine;
use overlay_core::{ColorRef, FontRef, ImageRef, RasterHandle, TextAlign};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::raster;

/// Line height as a multiple of font size.
const LINE_HEIGHT: f32 = 1.25;
/// Average glyph advance as a multiple of font size, used to size the label.
const GLYPH_ADVANCE: f32 = 0.6;

/// What to draw for one text label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    /// Text content; `\n` separates lines.
    pub text: String,
    /// Typeface, or `None` for sans-serif.
    pub font: Option<FontRef>,
    /// Fill color.
    pub color: ColorRef,
    /// Font size in pixels.
    pub size: f32,
    /// Line alignment within the label.
    pub align: TextAlign,
    /// Draw a translucent rounded panel behind the text.
    pub panel: bool,
}

impl TextSpec {
    /// A label with default styling.
    #[must_use]
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            font: None,
            color: ColorRef::WHITE,
            size,
            align: TextAlign::Center,
            panel: false,
        }
    }
}

/// Source of decoded images and rasterized text.
pub trait ResourceResolver: Send + Sync {
    /// Decode an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be found or decoded.
    fn load_image(&self, image: &ImageRef) -> RenderResult<RasterHandle>;

    /// Rasterize a text label.
    ///
    /// # Errors
    ///
    /// Returns an error if the label cannot be rendered.
    fn rasterize_text(&self, spec: &TextSpec) -> RenderResult<RasterHandle>;
}

/// Resolver for the local filesystem and inline data, with an in-memory cache.
pub struct DefaultResolver {
    base_dir: Option<PathBuf>,
    cache: Mutex<HashMap<String, RasterHandle>>,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for DefaultResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultResolver")
            .field("base_dir", &self.base_dir)
            .field("fonts", &self.fontdb.len())
            .finish_non_exhaustive()
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultResolver {
    /// A resolver with system fonts loaded.
    #[must_use]
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        debug!(fonts = fontdb.len(), "font database loaded");
        Self::with_fonts(fontdb)
    }

    /// A resolver using the given font database.
    #[must_use]
    pub fn with_fonts(fontdb: usvg::fontdb::Database) -> Self {
        Self {
            base_dir: None,
            cache: Mutex::new(HashMap::new()),
            fontdb: Arc::new(fontdb),
        }
    }

    /// Resolve relative paths against `dir`.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Register a raster under `source`, bypassing decoding.
    #[must_use]
    pub fn with_image(self, source: impl Into<String>, raster: RasterHandle) -> Self {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(source.into(), raster);
        }
        self
    }

    fn cached(&self, source: &str) -> Option<RasterHandle> {
        self.cache.lock().ok()?.get(source).cloned()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn fetch(&self, source: &str) -> RenderResult<RasterHandle> {
        if source.starts_with("data:") {
            return raster::decode(&decode_data_uri(source)?);
        }
        let path = source.strip_prefix("file://").unwrap_or(source);
        let path = self.resolve_path(path);
        let bytes = std::fs::read(&path)
            .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;
        raster::decode(&bytes)
    }
}

impl ResourceResolver for DefaultResolver {
    fn load_image(&self, image: &ImageRef) -> RenderResult<RasterHandle> {
        let source = image.as_str();
        if let Some(hit) = self.cached(source) {
            return Ok(hit);
        }

        let raster = self.fetch(source)?;
        debug!(
            source = %truncate(source, 64),
            width = raster.width(),
            height = raster.height(),
            "image decoded"
        );
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(source.to_string(), raster.clone());
        }
        Ok(raster)
    }

    fn rasterize_text(&self, spec: &TextSpec) -> RenderResult<RasterHandle> {
        let svg = text_svg(spec);
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| RenderError::Text(format!("SVG parsing failed: {e}")))?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (width, height) = (
            tree.size().width().ceil() as u32,
            tree.size().height().ceil() as u32,
        );
        let mut pixmap = raster::blank_pixmap(width.max(1), height.max(1))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        raster::from_pixmap(&pixmap)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Decode the payload of a `data:` URI.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Lay out a label as an SVG document sized to its estimated extent.
#[allow(clippy::cast_precision_loss)]
fn text_svg(spec: &TextSpec) -> String {
    let size = spec.size.max(1.0);
    let lines: Vec<&str> = spec.text.split('\n').collect();
    let pad = if spec.panel { size * 0.5 } else { size * 0.1 };

    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
    let width = (widest as f32 * size * GLYPH_ADVANCE + pad * 2.0).ceil();
    let height = (lines.len() as f32 * size * LINE_HEIGHT + pad * 2.0).ceil();

    let (anchor, x) = match spec.align {
        TextAlign::Left => ("start", pad),
        TextAlign::Center => ("middle", width / 2.0),
        TextAlign::Right => ("end", width - pad),
    };
    let family = spec.font.as_ref().map_or_else(
        || "sans-serif".to_string(),
        |font| format!("'{}', sans-serif", escape_xml(font.as_str())),
    );
    let [r, g, b, a] = spec.color.to_array();
    let opacity = f32::from(a) / 255.0;

    let mut svg = String::with_capacity(512);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">",
    );
    if spec.panel {
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" rx=\"{}\" fill=\"black\" fill-opacity=\"0.5\"/>",
            size * 0.3,
        );
    }
    let _ = write!(
        svg,
        "<text font-size=\"{size}\" font-family=\"{family}\" fill=\"rgb({r},{g},{b})\" \
         fill-opacity=\"{opacity}\" text-anchor=\"{anchor}\">",
    );
    for (i, line) in lines.iter().enumerate() {
        let baseline = pad + size * LINE_HEIGHT * i as f32 + size;
        let _ = write!(svg, "<tspan x=\"{x}\" y=\"{baseline}\">{}</tspan>", escape_xml(line));
    }
    svg.push_str("</text></svg>");
    svg
}
