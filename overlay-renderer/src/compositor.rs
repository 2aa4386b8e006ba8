//! # Compositor
//!
//! Two independent passes, each producing one canvas-sized raster:
//!
//! ```text
//! compose_background:  preview (cover) ─► decoration
//! compose_final:       frame (cover)   ─► composited background ─► elements[0..n]
//! ```
//!
//! Elements are drawn bottom to top in list order, centered on the canvas
//! center plus their offset, rotated, then scaled by their rendered scale.

use std::sync::Arc;

use overlay_core::{
    rendered_scale, BackgroundItem, Element, ElementKind, ExportRequest, RasterHandle,
    SessionConfig,
};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};
use tracing::{debug, warn};

use crate::error::RenderResult;
use crate::layout::{place, Placement};
use crate::raster;
use crate::resolver::{ResourceResolver, TextSpec};

/// Draws composites for one session configuration.
pub struct Compositor {
    config: Arc<SessionConfig>,
    resolver: Arc<dyn ResourceResolver>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("canvas_width", &self.config.render.canvas_width)
            .field("canvas_height", &self.config.render.canvas_height)
            .finish_non_exhaustive()
    }
}

fn paint() -> PixmapPaint {
    PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    }
}

#[allow(clippy::cast_precision_loss)]
fn size_of(pixmap: &Pixmap) -> (f32, f32) {
    (pixmap.width() as f32, pixmap.height() as f32)
}

/// Scale `source` to cover `canvas`, cropping the overflow evenly.
fn draw_cover(canvas: &mut Pixmap, source: &Pixmap) {
    let (cw, ch) = size_of(canvas);
    let (sw, sh) = size_of(source);
    let scale = (cw / sw).max(ch / sh);
    let transform = Transform::from_scale(scale, scale)
        .post_translate((cw - sw * scale) / 2.0, (ch - sh * scale) / 2.0);
    canvas.draw_pixmap(0, 0, source.as_ref(), &paint(), transform, None);
}

/// Stretch `source` into `rect`.
fn draw_into(canvas: &mut Pixmap, source: &Pixmap, rect: Placement) {
    let (sw, sh) = size_of(source);
    let transform = Transform::from_scale(rect.width / sw, rect.height / sh)
        .post_translate(rect.x, rect.y);
    canvas.draw_pixmap(0, 0, source.as_ref(), &paint(), transform, None);
}

impl Compositor {
    /// Create a compositor.
    #[must_use]
    pub fn new(config: Arc<SessionConfig>, resolver: Arc<dyn ResourceResolver>) -> Self {
        Self { config, resolver }
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn canvas(&self) -> RenderResult<Pixmap> {
        raster::blank_pixmap(self.config.render.canvas_width, self.config.render.canvas_height)
    }

    /// Render just the decoration over a transparent canvas.
    ///
    /// This is what a capture stores as its composited background.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoration's resources cannot be resolved.
    pub fn render_decoration(&self, item: Option<&BackgroundItem>) -> RenderResult<RasterHandle> {
        let mut canvas = self.canvas()?;
        if let Some(item) = item {
            self.draw_decoration(&mut canvas, item)?;
        }
        raster::from_pixmap(&canvas)
    }

    /// Live background composite: the preview frame with the decoration on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be allocated or the decoration's
    /// resources cannot be resolved.
    pub fn compose_background(
        &self,
        preview: Option<&RasterHandle>,
        item: Option<&BackgroundItem>,
    ) -> RenderResult<RasterHandle> {
        let mut canvas = self.canvas()?;
        if let Some(preview) = preview {
            draw_cover(&mut canvas, &raster::to_pixmap(preview)?);
        }
        if let Some(item) = item {
            self.draw_decoration(&mut canvas, item)?;
        }
        raster::from_pixmap(&canvas)
    }

    /// Final export composite.
    ///
    /// An element whose resources fail to resolve is skipped with a warning so
    /// one broken sticker does not lose the whole photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be allocated or a base layer
    /// cannot be converted.
    pub fn compose_final(&self, request: &ExportRequest) -> RenderResult<RasterHandle> {
        let mut canvas = self.canvas()?;
        let (cw, ch) = size_of(&canvas);

        draw_cover(&mut canvas, &raster::to_pixmap(&request.frame)?);
        draw_into(
            &mut canvas,
            &raster::to_pixmap(&request.composited_background)?,
            Placement {
                x: 0.0,
                y: 0.0,
                width: cw,
                height: ch,
            },
        );

        for element in &request.elements {
            if let Err(e) = self.draw_element(&mut canvas, element) {
                warn!(
                    element = %element.id,
                    kind = element.kind.name(),
                    error = %e,
                    "element skipped"
                );
            }
        }

        debug!(elements = request.elements.len(), "final composite drawn");
        raster::from_pixmap(&canvas)
    }

    fn draw_decoration(&self, canvas: &mut Pixmap, item: &BackgroundItem) -> RenderResult<()> {
        let area = size_of(canvas);
        let source = match item {
            BackgroundItem::Image { image: None, .. } => return Ok(()),
            BackgroundItem::Image {
                image: Some(image), ..
            } => self.resolver.load_image(image)?,
            BackgroundItem::Text {
                text,
                font,
                color,
                text_size,
                text_align,
                show_background_panel,
                ..
            } => self.resolver.rasterize_text(&TextSpec {
                text: text.clone(),
                font: font.clone(),
                color: *color,
                size: if *text_size > 0.0 {
                    *text_size
                } else {
                    self.config.render.background_text_size
                },
                align: *text_align,
                panel: *show_background_panel,
            })?,
        };

        let source = raster::to_pixmap(&source)?;
        let rect = place(item.layout(), area, size_of(&source));
        draw_into(canvas, &source, rect);
        Ok(())
    }

    /// The raster an element draws, and the base scale applied before its own.
    fn element_source(&self, element: &Element) -> RenderResult<(Pixmap, f32)> {
        let render = &self.config.render;
        match &element.kind {
            ElementKind::Image { image } => {
                let source = raster::to_pixmap(&self.resolver.load_image(image)?)?;
                let base = render.image_element_width / size_of(&source).0;
                Ok((source, base))
            }
            ElementKind::Text {
                text,
                font,
                color,
                align,
            } => {
                let label = self.resolver.rasterize_text(&TextSpec {
                    text: text.clone(),
                    font: font.clone(),
                    color: *color,
                    size: render.text_size,
                    align: *align,
                    panel: false,
                })?;
                Ok((raster::to_pixmap(&label)?, 1.0))
            }
        }
    }

    fn draw_element(&self, canvas: &mut Pixmap, element: &Element) -> RenderResult<()> {
        let (source, base) = self.element_source(element)?;
        let (sw, sh) = size_of(&source);
        let (cw, ch) = size_of(canvas);
        let t = &element.transform;
        let scale = rendered_scale(t.scale, &self.config.gesture);

        let transform = Transform::from_scale(base, base)
            .post_translate(-sw * base / 2.0, -sh * base / 2.0)
            .post_scale(scale, scale)
            .post_concat(Transform::from_rotate(t.rotation))
            .post_translate(cw / 2.0 + t.offset.x, ch / 2.0 + t.offset.y);

        canvas.draw_pixmap(0, 0, source.as_ref(), &paint(), transform, None);
        Ok(())
    }
}
