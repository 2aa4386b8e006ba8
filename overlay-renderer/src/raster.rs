//! Conversions between [`RasterHandle`], tiny-skia pixmaps and the `image`
//! crate, plus PNG encoding.
//!
//! Rasters hold straight RGBA; pixmaps hold premultiplied RGBA. Every crossing
//! between the two goes through this module.

use image::{ImageEncoder, RgbaImage};
use overlay_core::RasterHandle;
use tiny_skia::{ColorU8, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Allocate a transparent pixmap.
///
/// # Errors
///
/// Returns an error if either dimension is zero or too large.
pub fn blank_pixmap(width: u32, height: u32) -> RenderResult<Pixmap> {
    Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate {width}x{height} pixmap")))
}

/// Copy a raster into a premultiplied pixmap.
///
/// # Errors
///
/// Returns an error if the pixmap cannot be allocated.
pub fn to_pixmap(raster: &RasterHandle) -> RenderResult<Pixmap> {
    let mut pixmap = blank_pixmap(raster.width(), raster.height())?;
    for (dst, src) in pixmap
        .pixels_mut()
        .iter_mut()
        .zip(raster.pixels().chunks_exact(4))
    {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

/// Copy a pixmap out into a straight-alpha raster.
///
/// # Errors
///
/// Returns an error if the pixmap dimensions are rejected.
pub fn from_pixmap(pixmap: &Pixmap) -> RenderResult<RasterHandle> {
    let mut bytes = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        bytes.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(RasterHandle::from_rgba(pixmap.width(), pixmap.height(), bytes)?)
}

/// Wrap a decoded `image` buffer.
///
/// # Errors
///
/// Returns an error if the image has a zero dimension.
pub fn from_image(image: RgbaImage) -> RenderResult<RasterHandle> {
    let (width, height) = image.dimensions();
    Ok(RasterHandle::from_rgba(width, height, image.into_raw())?)
}

/// Decode encoded image bytes (PNG, JPEG, ...) into a raster.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image.
pub fn decode(bytes: &[u8]) -> RenderResult<RasterHandle> {
    let decoded = image::load_from_memory(bytes).map_err(|e| RenderError::Decode(e.to_string()))?;
    from_image(decoded.to_rgba8())
}

/// Encode a raster as PNG.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn encode_png(raster: &RasterHandle) -> RenderResult<Vec<u8>> {
    let mut buf = std::io::Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            raster.pixels(),
            raster.width(),
            raster.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
