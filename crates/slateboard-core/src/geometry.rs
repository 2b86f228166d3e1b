//! Pure hit-testing and measurement functions.
//!
//! All hit-testing runs in screen space: element points are pushed
//! through the viewport transform before comparing against the pointer,
//! so tolerances stay constant in pixels regardless of zoom.

use crate::element::{Element, TextElement};
use crate::viewport::Viewport;
use kurbo::{Point, Rect};

/// Pointer distance, in screen units, within which an element or a
/// resize handle counts as hit.
pub const HIT_TOLERANCE: f64 = 10.0;

/// Padding around a text element's measured box, in world units
/// (scaled with the viewport when hit-testing).
pub const TEXT_PADDING: f64 = 5.0;

/// Average glyph advance as a fraction of the font size. Keeps text
/// measurement font-independent so hit-testing works without a loaded
/// font.
const GLYPH_ADVANCE_FACTOR: f64 = 0.6;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Resize handle identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Nw,
    Ne,
    Se,
    Sw,
    N,
    E,
    S,
    W,
    /// Single bottom-right handle on text elements; drags font size.
    TextResize,
}

/// Distance from `p` to the segment `ab`, clamped to the endpoints when
/// the projection parameter falls outside [0, 1].
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ap = p - a;
    let ab = b - a;

    let len_sq = ab.hypot2();
    let t = if len_sq == 0.0 {
        // Degenerate segment: both endpoints coincide.
        0.0
    } else {
        (ap.dot(ab) / len_sq).clamp(0.0, 1.0)
    };

    let closest = a + ab * t;
    (p - closest).hypot()
}

/// Measure a text block in world units: (max line width, total height).
///
/// Width is an approximation from character counts; the renderer may
/// draw slightly narrower or wider depending on the host font, but
/// selection and hit-testing use this measure consistently.
pub fn measure_text(text: &str, font_size: f64) -> (f64, f64) {
    let mut lines = 0usize;
    let mut max_chars = 0usize;
    for line in text.split('\n') {
        lines += 1;
        max_chars = max_chars.max(line.chars().count());
    }
    let width = max_chars as f64 * font_size * GLYPH_ADVANCE_FACTOR;
    let height = lines as f64 * font_size * LINE_HEIGHT_FACTOR;
    (width, height)
}

/// Screen-space box of a text element, including padding.
pub fn text_screen_box(text: &TextElement, viewport: &Viewport) -> Rect {
    let pos = viewport.to_screen(text.position);
    let (w, h) = measure_text(&text.text, text.font_size());
    let padding = TEXT_PADDING * viewport.scale;
    Rect::new(
        pos.x - padding,
        pos.y - padding,
        pos.x + w * viewport.scale + padding,
        pos.y + h * viewport.scale + padding,
    )
}

/// Whether a screen-space point hits the given element.
pub fn is_point_in_element(screen: Point, element: &Element, viewport: &Viewport) -> bool {
    match element {
        Element::Pencil(e) => e
            .points
            .iter()
            .any(|p| (viewport.to_screen(*p) - screen).hypot() < HIT_TOLERANCE),
        Element::Line(e) | Element::Arrow(e) => {
            let [a, b] = match e.points.as_slice() {
                [a, b, ..] => [viewport.to_screen(*a), viewport.to_screen(*b)],
                _ => return false,
            };
            point_to_segment_distance(screen, a, b) < HIT_TOLERANCE
        }
        Element::Rectangle(e) => {
            let Some((p1, p2)) = two_screen_points(&e.points, viewport) else {
                return false;
            };
            screen.x >= p1.x.min(p2.x)
                && screen.x <= p1.x.max(p2.x)
                && screen.y >= p1.y.min(p2.y)
                && screen.y <= p1.y.max(p2.y)
        }
        Element::Diamond(e) => {
            let Some((p1, p2)) = two_screen_points(&e.points, viewport) else {
                return false;
            };
            let cx = (p1.x + p2.x) / 2.0;
            let cy = (p1.y + p2.y) / 2.0;
            let half_w = (p2.x - p1.x).abs() / 2.0;
            let half_h = (p2.y - p1.y).abs() / 2.0;
            (screen.x - cx).abs() / half_w + (screen.y - cy).abs() / half_h <= 1.0
        }
        Element::Ellipse(e) => {
            let Some((p1, p2)) = two_screen_points(&e.points, viewport) else {
                return false;
            };
            let cx = (p1.x + p2.x) / 2.0;
            let cy = (p1.y + p2.y) / 2.0;
            let rx = (p2.x - p1.x).abs() / 2.0;
            let ry = (p2.y - p1.y).abs() / 2.0;
            ((screen.x - cx) / rx).powi(2) + ((screen.y - cy) / ry).powi(2) <= 1.0
        }
        Element::Text(e) => text_screen_box(e, viewport).contains(screen),
    }
}

/// The resize handle under a screen-space point, if any.
///
/// Two-point kinds expose eight handles at the corners and edge
/// midpoints of their bounding box; text exposes one bottom-right
/// handle; freehand strokes have none.
pub fn resize_handle_at(screen: Point, element: &Element, viewport: &Viewport) -> Option<Handle> {
    match element {
        Element::Pencil(_) => None,
        Element::Text(e) => {
            let rect = text_screen_box(e, viewport);
            let corner = Point::new(rect.x1, rect.y1);
            let near = (screen.x - corner.x).abs() < HIT_TOLERANCE
                && (screen.y - corner.y).abs() < HIT_TOLERANCE;
            near.then_some(Handle::TextResize)
        }
        _ => {
            let (p1, p2) = two_screen_points(element.points(), viewport)?;
            let mid_x = (p1.x + p2.x) / 2.0;
            let mid_y = (p1.y + p2.y) / 2.0;
            let handles = [
                (Handle::Nw, Point::new(p1.x, p1.y)),
                (Handle::Ne, Point::new(p2.x, p1.y)),
                (Handle::Se, Point::new(p2.x, p2.y)),
                (Handle::Sw, Point::new(p1.x, p2.y)),
                (Handle::N, Point::new(mid_x, p1.y)),
                (Handle::E, Point::new(p2.x, mid_y)),
                (Handle::S, Point::new(mid_x, p2.y)),
                (Handle::W, Point::new(p1.x, mid_y)),
            ];
            handles.into_iter().find_map(|(id, pos)| {
                let near = (pos.x - screen.x).abs() < HIT_TOLERANCE
                    && (pos.y - screen.y).abs() < HIT_TOLERANCE;
                near.then_some(id)
            })
        }
    }
}

/// Positions of the eight box handles, in screen space, for rendering.
pub fn box_handle_positions(p1: Point, p2: Point) -> [Point; 8] {
    let mid_x = (p1.x + p2.x) / 2.0;
    let mid_y = (p1.y + p2.y) / 2.0;
    [
        Point::new(p1.x, p1.y),
        Point::new(p2.x, p1.y),
        Point::new(p2.x, p2.y),
        Point::new(p1.x, p2.y),
        Point::new(mid_x, p1.y),
        Point::new(p2.x, mid_y),
        Point::new(mid_x, p2.y),
        Point::new(p1.x, mid_y),
    ]
}

fn two_screen_points(points: &[Point], viewport: &Viewport) -> Option<(Point, Point)> {
    match points {
        [a, b, ..] => Some((viewport.to_screen(*a), viewport.to_screen(*b))),
        _ => None,
    }
}
