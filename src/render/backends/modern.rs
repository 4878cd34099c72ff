use crate::render::backend::{ErasedSurface, RenderBackend, RgbaImage, SurfaceSize};
use crate::render::RenderList;
use anyhow::{anyhow, Result};
use std::any::Any;

/// Backend for hosts with a full 2D context (paths, ellipses, global alpha).
///
/// Every display item maps to a native drawing call, so rendering never needs
/// emulation.
pub struct ModernBackend;

impl ModernBackend {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

impl RenderBackend for ModernBackend {
    fn name(&self) -> &str {
        "ModernBackend"
    }

    fn create_surface(&self, size: SurfaceSize) -> Result<Box<dyn ErasedSurface + Send>> {
        Ok(Box::new(ModernSurface::new(size)?))
    }

    fn render(&mut self, list: &RenderList, surface: &mut dyn ErasedSurface) -> Result<()> {
        let s = surface
            .as_any_mut()
            .downcast_mut::<ModernSurface>()
            .ok_or_else(|| anyhow!("ModernBackend used with non-Modern surface"))?;

        s.items_drawn = list.len();
        s.background = list.background();
        s.frame_id = s.frame_id.wrapping_add(1);
        Ok(())
    }

    fn snapshot(&mut self, surface: &mut dyn ErasedSurface, max_dim: u32) -> Result<RgbaImage> {
        let s = surface
            .as_any_mut()
            .downcast_mut::<ModernSurface>()
            .ok_or_else(|| anyhow!("ModernBackend used with non-Modern surface"))?;

        Ok(RgbaImage::filled(s.size.fit_within(max_dim), s.background))
    }
}

pub struct ModernSurface {
    /// Size of the surface in pixels.
    pub size: SurfaceSize,
    /// Frame ID, bumped on every render.
    pub frame_id: u64,
    /// Number of items replayed by the last render.
    pub items_drawn: usize,
    background: crate::render::Color,
}

impl ModernSurface {
    pub fn new(size: SurfaceSize) -> Result<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!(
                "surface must have a non-zero size, got {}x{}",
                size.width,
                size.height
            ));
        }
        Ok(Self {
            size,
            frame_id: 0,
            items_drawn: 0,
            background: crate::render::Color::WHITE,
        })
    }
}

impl ErasedSurface for ModernSurface {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn size(&self) -> SurfaceSize {
        self.size
    }
}
