//! CPU glyph rasterization.

use crate::surface::Surface;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use kurbo::Point;
use peniko::Color;

/// Draw one line of text with its top-left corner at `pos` (screen
/// pixels). Advances the pen with per-pair kerning; glyphs without an
/// outline (spaces) only advance.
pub fn draw_line(
    surface: &mut Surface,
    font: &FontArc,
    text: &str,
    pos: Point,
    px: f32,
    color: Color,
) {
    let scale = PxScale::from(px);
    let scaled = font.as_scaled(scale);
    let baseline = pos.y as f32 + scaled.ascent();

    let mut pen_x = pos.x as f32;
    let mut prev_gid: Option<ab_glyph::GlyphId> = None;

    for ch in text.chars() {
        let gid = font.glyph_id(ch);
        if let Some(prev) = prev_gid {
            pen_x += scaled.kern(prev, gid);
        }

        let glyph = gid.with_scale_and_position(scale, point(pen_x, baseline));
        if let Some(outline) = font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            outline.draw(|x, y, v| {
                surface.blend_pixel(
                    bounds.min.x as i64 + x as i64,
                    bounds.min.y as i64 + y as i64,
                    color,
                    v,
                );
            });
        }

        pen_x += scaled.h_advance(gid);
        prev_gid = Some(gid);
    }
}
