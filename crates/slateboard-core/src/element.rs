//! Element model: the canonical representation of drawable objects.
//!
//! Elements serialize to the wire shape used by the persistence layer:
//! a lowercase `type` tag plus camelCase fields. Round-trip fidelity of
//! that shape, including optional-field presence, is load-bearing.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Font size used when a text element does not carry one.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Error for elements whose stored shape does not match their kind.
#[derive(Debug, Error)]
#[error("invalid {kind} element {id}: expected {expected} points, got {got}")]
pub struct ValidationError {
    pub id: String,
    pub kind: &'static str,
    pub expected: &'static str,
    pub got: usize,
}

/// A path-based element: freehand stroke, line, arrow, or a two-corner
/// bounding-box shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathElement {
    pub id: String,
    #[serde(default)]
    pub points: Vec<Point>,
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl PathElement {
    /// Create a new path element with a fresh id.
    pub fn new(points: Vec<Point>, stroke_color: impl Into<String>, stroke_width: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            points,
            stroke_color: stroke_color.into(),
            stroke_width,
        }
    }
}

/// A text element anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    /// Always empty; kept so the wire shape matches the other kinds.
    #[serde(default)]
    pub points: Vec<Point>,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub text: String,
    pub position: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl TextElement {
    /// Create a new text element with a fresh id.
    pub fn new(
        text: impl Into<String>,
        position: Point,
        font_size: Option<f64>,
        stroke_color: impl Into<String>,
        stroke_width: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            points: Vec::new(),
            stroke_color: stroke_color.into(),
            stroke_width,
            text: text.into(),
            position,
            font_size,
        }
    }

    /// Effective font size, falling back to the default.
    pub fn font_size(&self) -> f64 {
        self.font_size.unwrap_or(DEFAULT_FONT_SIZE)
    }
}

/// A drawable element, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Pencil(PathElement),
    Line(PathElement),
    Rectangle(PathElement),
    Diamond(PathElement),
    Ellipse(PathElement),
    Arrow(PathElement),
    Text(TextElement),
}

impl Element {
    /// Stable element id.
    pub fn id(&self) -> &str {
        match self {
            Element::Pencil(e)
            | Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => &e.id,
            Element::Text(e) => &e.id,
        }
    }

    /// The kind tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Pencil(_) => "pencil",
            Element::Line(_) => "line",
            Element::Rectangle(_) => "rectangle",
            Element::Diamond(_) => "diamond",
            Element::Ellipse(_) => "ellipse",
            Element::Arrow(_) => "arrow",
            Element::Text(_) => "text",
        }
    }

    /// Anchor points in world coordinates (empty for text).
    pub fn points(&self) -> &[Point] {
        match self {
            Element::Pencil(e)
            | Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => &e.points,
            Element::Text(e) => &e.points,
        }
    }

    pub fn stroke_color(&self) -> &str {
        match self {
            Element::Pencil(e)
            | Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => &e.stroke_color,
            Element::Text(e) => &e.stroke_color,
        }
    }

    pub fn stroke_width(&self) -> f64 {
        match self {
            Element::Pencil(e)
            | Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => e.stroke_width,
            Element::Text(e) => e.stroke_width,
        }
    }

    /// Whether this kind is defined by exactly two anchor points.
    pub fn is_two_point(&self) -> bool {
        matches!(
            self,
            Element::Line(_)
                | Element::Rectangle(_)
                | Element::Diamond(_)
                | Element::Ellipse(_)
                | Element::Arrow(_)
        )
    }

    /// Replace the anchor points of a path-based element.
    /// No-op for text.
    pub fn set_points(&mut self, points: Vec<Point>) {
        match self {
            Element::Pencil(e)
            | Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => e.points = points,
            Element::Text(_) => {}
        }
    }

    /// Translate by (dx, dy) world units. Text moves its position,
    /// everything else moves every point.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Element::Pencil(e)
            | Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => {
                for p in &mut e.points {
                    p.x += dx;
                    p.y += dy;
                }
            }
            Element::Text(e) => {
                e.position.x += dx;
                e.position.y += dy;
            }
        }
    }

    /// World-space bounding box. Empty rect at origin for an element
    /// with no points.
    pub fn bounds(&self) -> Rect {
        match self {
            Element::Text(e) => {
                let (w, h) = crate::geometry::measure_text(&e.text, e.font_size());
                Rect::new(e.position.x, e.position.y, e.position.x + w, e.position.y + h)
            }
            _ => {
                let points = self.points();
                let Some(first) = points.first() else {
                    return Rect::ZERO;
                };
                let mut rect = Rect::from_points(*first, *first);
                for p in &points[1..] {
                    rect = rect.union_pt(*p);
                }
                rect
            }
        }
    }

    /// Check that the stored points match the element kind.
    /// Called on load/import; never during editing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let got = self.points().len();
        let ok = match self {
            Element::Pencil(_) | Element::Text(_) => true,
            _ => got == 2,
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError {
                id: self.id().to_string(),
                kind: self.kind(),
                expected: "exactly 2",
                got,
            })
        }
    }
}
