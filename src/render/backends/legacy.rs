use crate::render::backend::{ErasedSurface, RenderBackend, RgbaImage, SurfaceSize};
use crate::render::{DisplayItem, RenderList};
use anyhow::{anyhow, Result};
use std::any::Any;

/// Backend for limited hosts that expose a 2D context without path or alpha support.
///
/// Circles have to be approximated with polylines and translucent colors are
/// drawn opaque. Both are counted on the surface so callers can tell how much
/// of a frame was emulated.
pub struct LegacyBackend;

impl LegacyBackend {
    pub fn new() -> Result<Self> {
        Ok(Self)
    }
}

/// True when the legacy context cannot draw `item` natively.
fn needs_emulation(item: &DisplayItem) -> bool {
    matches!(item, DisplayItem::Circle { .. })
        || item.color().map(|c| c.is_translucent()).unwrap_or(false)
}

impl RenderBackend for LegacyBackend {
    fn name(&self) -> &str {
        "LegacyBackend"
    }

    fn create_surface(&self, size: SurfaceSize) -> Result<Box<dyn ErasedSurface + Send>> {
        Ok(Box::new(LegacySurface::new(size)?))
    }

    fn render(&mut self, list: &RenderList, surface: &mut dyn ErasedSurface) -> Result<()> {
        let s = surface
            .as_any_mut()
            .downcast_mut::<LegacySurface>()
            .ok_or_else(|| anyhow!("LegacyBackend used with non-Legacy surface"))?;

        let emulated = list.items.iter().filter(|item| needs_emulation(item)).count();
        if emulated > 0 {
            log::debug!("LegacyBackend: emulating {} of {} display items", emulated, list.len());
        }

        s.items_drawn = list.len();
        s.items_emulated = emulated;
        s.background = list.background();
        s.frame_id = s.frame_id.wrapping_add(1);
        Ok(())
    }

    fn snapshot(&mut self, surface: &mut dyn ErasedSurface, max_dim: u32) -> Result<RgbaImage> {
        let s = surface
            .as_any_mut()
            .downcast_mut::<LegacySurface>()
            .ok_or_else(|| anyhow!("LegacyBackend used with non-Legacy surface"))?;

        // No alpha channel on legacy contexts
        let mut background = s.background;
        background.a = 1.0;
        Ok(RgbaImage::filled(s.size.fit_within(max_dim), background))
    }
}

pub struct LegacySurface {
    pub size: SurfaceSize,
    pub frame_id: u64,
    pub items_drawn: usize,
    /// Items in the last frame that had no native drawing call.
    pub items_emulated: usize,
    background: crate::render::Color,
}

impl LegacySurface {
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
            items_emulated: 0,
            background: crate::render::Color::WHITE,
        })
    }
}

impl ErasedSurface for LegacySurface {
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
