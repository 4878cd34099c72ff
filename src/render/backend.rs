use std::any::Any;

use crate::render::{Color, RenderList};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scales the size down so that neither side exceeds `max_dim`, keeping the aspect ratio.
    /// Sizes that already fit are returned unchanged. Sides never drop below 1.
    pub fn fit_within(&self, max_dim: u32) -> SurfaceSize {
        let longest = self.width.max(self.height);
        if longest <= max_dim || longest == 0 {
            return *self;
        }

        let scale = max_dim as f64 / longest as f64;
        SurfaceSize {
            width: ((self.width as f64 * scale).round() as u32).max(1),
            height: ((self.height as f64 * scale).round() as u32).max(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
}

/// Small RGBA snapshot for thumbnails and menu previews.
#[derive(Clone)]
pub struct RgbaImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
}

impl RgbaImage {
    /// Creates an image of `size` where every pixel has `color`.
    pub fn filled(size: SurfaceSize, color: Color) -> Self {
        let rgba = color.to_u8();
        let count = (size.width as usize) * (size.height as usize);
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }

        Self {
            pixels,
            width: size.width,
            height: size.height,
            stride: size.width * 4,
            format: PixelFormat::Rgba8,
        }
    }

    /// Returns the RGBA value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.stride + x * 4) as usize;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Type-erased surface so a session can hold it without generics.
pub trait ErasedSurface: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn size(&self) -> SurfaceSize;
}

/// Core backend interface. One backend drives exactly one session's canvas.
pub trait RenderBackend {
    /// Human readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Create a new surface with the given size.
    fn create_surface(&self, size: SurfaceSize) -> anyhow::Result<Box<dyn ErasedSurface + Send>>;

    /// Replay the display list onto the given surface.
    fn render(&mut self, list: &RenderList, surface: &mut dyn ErasedSurface) -> anyhow::Result<()>;

    /// Generate a small RGBA8 snapshot of the surface, suitable for thumbnails or previews.
    fn snapshot(
        &mut self,
        surface: &mut dyn ErasedSurface,
        max_dim: u32,
    ) -> anyhow::Result<RgbaImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_within_keeps_aspect_ratio() {
        let size = SurfaceSize::new(800, 600);
        assert_eq!(size.fit_within(80), SurfaceSize::new(80, 60));
        assert_eq!(size.fit_within(1000), size);
    }

    #[test]
    fn filled_image_has_expected_pixels() {
        let img = RgbaImage::filled(SurfaceSize::new(2, 3), Color::BLACK);
        assert_eq!(img.pixels.len(), 2 * 3 * 4);
        assert_eq!(img.pixel(1, 2), Some([0, 0, 0, 255]));
        assert_eq!(img.pixel(2, 0), None);
    }
}
