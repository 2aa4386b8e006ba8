//! Placement of background decorations inside the canvas.

use overlay_core::Layout;

/// An axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// Place content of intrinsic size `content` inside an `area` according to
/// `layout`.
///
/// `fill_parent` stretches to the padded area. Otherwise a fixed width or
/// height replaces the intrinsic one, keeping the aspect ratio when only one
/// is given, and the anchor positions the result inside the padded area.
#[must_use]
pub fn place(layout: &Layout, area: (f32, f32), content: (f32, f32)) -> Placement {
    let pad = layout.padding;
    let inner_w = (area.0 - pad.start - pad.end).max(0.0);
    let inner_h = (area.1 - pad.top - pad.bottom).max(0.0);

    if layout.fill_parent {
        return Placement {
            x: pad.start,
            y: pad.top,
            width: inner_w,
            height: inner_h,
        };
    }

    let (cw, ch) = (content.0.max(1.0), content.1.max(1.0));
    let (width, height) = match (layout.width > 0.0, layout.height > 0.0) {
        (true, true) => (layout.width, layout.height),
        (true, false) => (layout.width, ch * layout.width / cw),
        (false, true) => (cw * layout.height / ch, layout.height),
        (false, false) => (cw, ch),
    };

    let (fx, fy) = layout.anchor.fractions();
    Placement {
        x: pad.start + (inner_w - width) * fx,
        y: pad.top + (inner_h - height) * fy,
        width,
        height,
    }
}
