//! Scene rasterizer.
//!
//! Draws in screen space: element points go through the viewport
//! transform first, stroke widths scale with the zoom, selection
//! chrome stays at constant pixel size.

use crate::color::parse_hex_color;
use crate::surface::Surface;
use crate::text;
use ab_glyph::FontArc;
use kurbo::{Point, Rect};
use peniko::Color;
use slateboard_core::element::{Element, PathElement, TextElement};
use slateboard_core::geometry;
use slateboard_core::scene::Scene;
use slateboard_core::viewport::Viewport;
use std::f64::consts::PI;

/// Grid spacing in world units.
pub const GRID_SIZE: f64 = 20.0;

/// Arrowhead wing length in world units and half-angle off the shaft.
const ARROWHEAD_LENGTH: f64 = 15.0;
const ARROWHEAD_ANGLE: f64 = PI / 6.0;

/// Selection outline dash pattern (on, off) in screen pixels.
const SELECTION_DASH: (f64, f64) = (5.0, 5.0);

/// Selection handle radius in screen pixels.
const HANDLE_RADIUS: f64 = 6.0;

/// Canvas color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn background(self) -> Color {
        match self {
            Theme::Light => Color::from_rgba8(255, 255, 255, 255),
            Theme::Dark => Color::from_rgba8(26, 26, 26, 255),
        }
    }

    fn grid(self) -> Color {
        match self {
            Theme::Light => Color::from_rgba8(0, 0, 0, 26),
            Theme::Dark => Color::from_rgba8(255, 255, 255, 26),
        }
    }

    fn accent(self) -> Color {
        Color::from_rgba8(0x42, 0x85, 0xf4, 255)
    }
}

/// CPU renderer for a whiteboard scene.
pub struct Renderer {
    theme: Theme,
    /// Font for text elements; without one, text is skipped.
    font: Option<FontArc>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme, font: None }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Rasterize one frame: background, grid, elements in z-order, the
    /// in-progress element on top, then selection chrome.
    pub fn render(&self, scene: &Scene, viewport: &Viewport, surface: &mut Surface) {
        surface.fill(self.theme.background());
        self.draw_grid(viewport, surface);

        for element in scene.elements() {
            self.draw_element(element, viewport, surface);
        }
        if let Some(current) = scene.current() {
            self.draw_element(current, viewport, surface);
        }
        if let Some(selected) = scene.selected_element() {
            self.draw_selection(selected, viewport, surface);
        }
    }

    fn draw_grid(&self, viewport: &Viewport, surface: &mut Surface) {
        let spacing = GRID_SIZE * viewport.scale;
        if spacing < 2.0 {
            return;
        }
        let color = self.theme.grid();
        let width = surface.width() as f64;
        let height = surface.height() as f64;

        let mut x = viewport.offset.x.rem_euclid(spacing);
        while x < width {
            stroke_segment(
                surface,
                Point::new(x, 0.0),
                Point::new(x, height),
                1.0,
                color,
            );
            x += spacing;
        }
        let mut y = viewport.offset.y.rem_euclid(spacing);
        while y < height {
            stroke_segment(
                surface,
                Point::new(0.0, y),
                Point::new(width, y),
                1.0,
                color,
            );
            y += spacing;
        }
    }

    fn draw_element(&self, element: &Element, viewport: &Viewport, surface: &mut Surface) {
        match element {
            Element::Pencil(e) => self.draw_pencil(e, viewport, surface),
            Element::Line(e) => {
                if let Some((a, b)) = endpoints(e, viewport) {
                    stroke_segment(surface, a, b, stroke_width(e, viewport), stroke_color(e));
                }
            }
            Element::Rectangle(e) => {
                if let Some((a, b)) = endpoints(e, viewport) {
                    stroke_polygon(
                        surface,
                        &rect_corners(a, b),
                        stroke_width(e, viewport),
                        stroke_color(e),
                    );
                }
            }
            Element::Diamond(e) => {
                if let Some((a, b)) = endpoints(e, viewport) {
                    stroke_polygon(
                        surface,
                        &diamond_corners(a, b),
                        stroke_width(e, viewport),
                        stroke_color(e),
                    );
                }
            }
            Element::Ellipse(e) => {
                if let Some((a, b)) = endpoints(e, viewport) {
                    stroke_ellipse(surface, a, b, stroke_width(e, viewport), stroke_color(e));
                }
            }
            Element::Arrow(e) => {
                if let Some((a, b)) = endpoints(e, viewport) {
                    let width = stroke_width(e, viewport);
                    let color = stroke_color(e);
                    stroke_segment(surface, a, b, width, color);
                    for wing in arrowhead_wings(a, b, ARROWHEAD_LENGTH * viewport.scale) {
                        stroke_segment(surface, b, wing, width, color);
                    }
                }
            }
            Element::Text(e) => self.draw_text(e, viewport, surface),
        }
    }

    fn draw_pencil(&self, e: &PathElement, viewport: &Viewport, surface: &mut Surface) {
        let width = stroke_width(e, viewport);
        let color = stroke_color(e);
        match e.points.as_slice() {
            [] => {}
            [p] => stamp_disc(surface, viewport.to_screen(*p), width / 2.0, color),
            points => {
                for pair in points.windows(2) {
                    stroke_segment(
                        surface,
                        viewport.to_screen(pair[0]),
                        viewport.to_screen(pair[1]),
                        width,
                        color,
                    );
                }
            }
        }
    }

    fn draw_text(&self, e: &TextElement, viewport: &Viewport, surface: &mut Surface) {
        let Some(font) = &self.font else {
            return;
        };
        let color = parse_hex_color(&e.stroke_color);
        let px = (e.font_size() * viewport.scale) as f32;
        let line_height = e.font_size() * viewport.scale * geometry::LINE_HEIGHT_FACTOR;
        let top = viewport.to_screen(e.position);

        for (i, line) in e.text.split('\n').enumerate() {
            let pos = Point::new(top.x, top.y + i as f64 * line_height);
            text::draw_line(surface, font, line, pos, px, color);
        }
    }

    fn draw_selection(&self, element: &Element, viewport: &Viewport, surface: &mut Surface) {
        let accent = self.theme.accent();
        match element {
            Element::Text(e) => {
                let rect = geometry::text_screen_box(e, viewport);
                dashed_rect(surface, rect, accent);
                stamp_disc(surface, Point::new(rect.x1, rect.y1), HANDLE_RADIUS, accent);
            }
            Element::Pencil(_) => {
                // Freehand strokes get an outline but no handles.
                let bounds = element.bounds();
                let p0 = viewport.to_screen(Point::new(bounds.x0, bounds.y0));
                let p1 = viewport.to_screen(Point::new(bounds.x1, bounds.y1));
                dashed_rect(surface, Rect::new(p0.x, p0.y, p1.x, p1.y), accent);
            }
            _ => {
                let [p1, p2, ..] = element.points() else { return };
                let a = viewport.to_screen(*p1);
                let b = viewport.to_screen(*p2);
                dashed_rect(
                    surface,
                    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y)),
                    accent,
                );
                for handle in geometry::box_handle_positions(a, b) {
                    stamp_disc(surface, handle, HANDLE_RADIUS, accent);
                }
            }
        }
    }
}

fn stroke_color(e: &PathElement) -> Color {
    parse_hex_color(&e.stroke_color)
}

fn stroke_width(e: &PathElement, viewport: &Viewport) -> f64 {
    (e.stroke_width * viewport.scale).max(1.0)
}

fn endpoints(e: &PathElement, viewport: &Viewport) -> Option<(Point, Point)> {
    match e.points.as_slice() {
        [a, b, ..] => Some((viewport.to_screen(*a), viewport.to_screen(*b))),
        _ => None,
    }
}

fn rect_corners(a: Point, b: Point) -> [Point; 4] {
    [a, Point::new(b.x, a.y), b, Point::new(a.x, b.y)]
}

fn diamond_corners(a: Point, b: Point) -> [Point; 4] {
    let cx = (a.x + b.x) / 2.0;
    let cy = (a.y + b.y) / 2.0;
    [
        Point::new(cx, a.y),
        Point::new(b.x, cy),
        Point::new(cx, b.y),
        Point::new(a.x, cy),
    ]
}

/// The two free endpoints of an arrowhead at `tip`, swept back toward
/// `tail` at the arrowhead angle.
fn arrowhead_wings(tail: Point, tip: Point, length: f64) -> [Point; 2] {
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    [
        Point::new(
            tip.x - length * (angle - ARROWHEAD_ANGLE).cos(),
            tip.y - length * (angle - ARROWHEAD_ANGLE).sin(),
        ),
        Point::new(
            tip.x - length * (angle + ARROWHEAD_ANGLE).cos(),
            tip.y - length * (angle + ARROWHEAD_ANGLE).sin(),
        ),
    ]
}

/// Stroke a segment by scanning its bounding box and converting the
/// distance to the segment into pixel coverage.
fn stroke_segment(surface: &mut Surface, a: Point, b: Point, width: f64, color: Color) {
    let half = width / 2.0;
    let x0 = (a.x.min(b.x) - half - 1.0).floor() as i64;
    let x1 = (a.x.max(b.x) + half + 1.0).ceil() as i64;
    let y0 = (a.y.min(b.y) - half - 1.0).floor() as i64;
    let y1 = (a.y.max(b.y) + half + 1.0).ceil() as i64;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let dist = geometry::point_to_segment_distance(p, a, b);
            let coverage = (half + 0.5 - dist).clamp(0.0, 1.0);
            if coverage > 0.0 {
                surface.blend_pixel(x, y, color, coverage as f32);
            }
        }
    }
}

fn stroke_polygon(surface: &mut Surface, corners: &[Point], width: f64, color: Color) {
    for i in 0..corners.len() {
        let next = corners[(i + 1) % corners.len()];
        stroke_segment(surface, corners[i], next, width, color);
    }
}

fn stroke_ellipse(surface: &mut Surface, a: Point, b: Point, width: f64, color: Color) {
    const SEGMENTS: usize = 128;
    let cx = (a.x + b.x) / 2.0;
    let cy = (a.y + b.y) / 2.0;
    let rx = (b.x - a.x).abs() / 2.0;
    let ry = (b.y - a.y).abs() / 2.0;

    let mut prev = Point::new(cx + rx, cy);
    for i in 1..=SEGMENTS {
        let t = i as f64 / SEGMENTS as f64 * 2.0 * PI;
        let next = Point::new(cx + rx * t.cos(), cy + ry * t.sin());
        stroke_segment(surface, prev, next, width, color);
        prev = next;
    }
}

fn stamp_disc(surface: &mut Surface, center: Point, radius: f64, color: Color) {
    let x0 = (center.x - radius - 1.0).floor() as i64;
    let x1 = (center.x + radius + 1.0).ceil() as i64;
    let y0 = (center.y - radius - 1.0).floor() as i64;
    let y1 = (center.y + radius + 1.0).ceil() as i64;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            let dist = (p - center).hypot();
            let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if coverage > 0.0 {
                surface.blend_pixel(x, y, color, coverage as f32);
            }
        }
    }
}

/// Dash a rectangle outline with the selection pattern.
fn dashed_rect(surface: &mut Surface, rect: Rect, color: Color) {
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    for i in 0..4 {
        dashed_segment(surface, corners[i], corners[(i + 1) % 4], color);
    }
}

fn dashed_segment(surface: &mut Surface, a: Point, b: Point, color: Color) {
    let (on, off) = SELECTION_DASH;
    let total = (b - a).hypot();
    if total <= 0.0 {
        return;
    }
    let dir = (b - a) * (1.0 / total);

    let mut travelled = 0.0;
    while travelled < total {
        let end = (travelled + on).min(total);
        stroke_segment(
            surface,
            a + dir * travelled,
            a + dir * end,
            1.0,
            color,
        );
        travelled = end + off;
    }
}
