//! Slateboard Render Library
//!
//! CPU rasterizer for slateboard scenes: draws the grid, the element
//! list, the in-progress element, and the selection chrome into an
//! RGBA8 surface that can be presented or exported as PNG.

pub mod color;
pub mod renderer;
pub mod surface;
mod text;

pub use color::parse_hex_color;
pub use renderer::{Renderer, Theme};
pub use surface::{RenderError, Surface};
