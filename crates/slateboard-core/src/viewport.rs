//! Viewport: pan/zoom transform between world and screen coordinates.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom scale.
pub const MIN_SCALE: f64 = 0.1;
/// Maximum allowed zoom scale.
pub const MAX_SCALE: f64 = 5.0;

/// Multiplicative step applied per zoom-in tick.
const ZOOM_IN_FACTOR: f64 = 1.1;
/// Multiplicative step applied per zoom-out tick.
const ZOOM_OUT_FACTOR: f64 = 0.9;

/// View transform for the canvas: `screen = world * scale + offset`.
///
/// Pan is expressed in screen units; zoom is a uniform scale clamped
/// to [`MIN_SCALE`, `MAX_SCALE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset in screen units.
    pub offset: Vec2,
    /// Current zoom scale.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport at the identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a world point to screen coordinates.
    pub fn to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset.x,
            world.y * self.scale + self.offset.y,
        )
    }

    /// Convert a screen point to world coordinates.
    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }

    /// Pan by a delta in screen units.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Apply one zoom tick at the given screen point, keeping the world
    /// point under the cursor fixed. Positive `delta_y` (scroll down)
    /// zooms out.
    pub fn zoom_at(&mut self, screen_point: Point, delta_y: f64) {
        let factor = if delta_y > 0.0 {
            ZOOM_OUT_FACTOR
        } else {
            ZOOM_IN_FACTOR
        };
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.to_world(screen_point);
        self.scale = new_scale;

        // Move the offset so world_point lands back on screen_point.
        let new_screen = self.to_screen(world_point);
        self.offset += Vec2::new(
            screen_point.x - new_screen.x,
            screen_point.y - new_screen.y,
        );
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }
}
