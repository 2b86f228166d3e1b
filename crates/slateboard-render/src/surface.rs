//! RGBA8 pixel surface.

use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// An owned RGBA8 pixel buffer in row-major order.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Create a surface filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fill the whole surface with an opaque color.
    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();
        for pixel in self.data.chunks_exact_mut(4) {
            pixel[0] = rgba.r;
            pixel[1] = rgba.g;
            pixel[2] = rgba.b;
            pixel[3] = rgba.a;
        }
    }

    /// The pixel at (x, y), or None outside the surface.
    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Source-over blend one pixel. `coverage` scales the color's own
    /// alpha; out-of-bounds coordinates are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let rgba = color.to_rgba8();
        let alpha = (rgba.a as f32 / 255.0 * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }

        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let blend = |src: u8, dst: u8| -> u8 {
            (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8
        };
        self.data[idx] = blend(rgba.r, self.data[idx]);
        self.data[idx + 1] = blend(rgba.g, self.data[idx + 1]);
        self.data[idx + 2] = blend(rgba.b, self.data[idx + 2]);
        let dst_a = self.data[idx + 3] as f32 / 255.0;
        self.data[idx + 3] = ((alpha + dst_a * (1.0 - alpha)) * 255.0).round() as u8;
    }

    /// Encode the surface as a PNG file.
    pub fn to_png_bytes(&self) -> RenderResult<Vec<u8>> {
        let mut bytes = Vec::new();
        let mut encoder = png::Encoder::new(&mut bytes, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        writer.finish()?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_pixel() {
        let mut surface = Surface::new(4, 4);
        surface.fill(Color::from_rgba8(10, 20, 30, 255));
        assert_eq!(surface.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(surface.pixel(3, 3), Some([10, 20, 30, 255]));
        assert_eq!(surface.pixel(4, 0), None);
        assert_eq!(surface.pixel(-1, 0), None);
    }

    #[test]
    fn test_blend_full_coverage_replaces() {
        let mut surface = Surface::new(2, 2);
        surface.fill(Color::from_rgba8(0, 0, 0, 255));
        surface.blend_pixel(1, 1, Color::from_rgba8(255, 0, 0, 255), 1.0);
        assert_eq!(surface.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_blend_half_coverage_mixes() {
        let mut surface = Surface::new(1, 1);
        surface.fill(Color::from_rgba8(0, 0, 0, 255));
        surface.blend_pixel(0, 0, Color::from_rgba8(255, 255, 255, 255), 0.5);
        let [r, g, b, a] = surface.pixel(0, 0).unwrap();
        assert_eq!((r, g, b, a), (128, 128, 128, 255));
    }

    #[test]
    fn test_blend_outside_is_noop() {
        let mut surface = Surface::new(2, 2);
        surface.blend_pixel(5, 5, Color::from_rgba8(255, 0, 0, 255), 1.0);
        surface.blend_pixel(-1, 0, Color::from_rgba8(255, 0, 0, 255), 1.0);
    }

    #[test]
    fn test_png_bytes_have_signature() {
        let mut surface = Surface::new(8, 8);
        surface.fill(Color::from_rgba8(255, 255, 255, 255));
        let bytes = surface.to_png_bytes().unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }
}
