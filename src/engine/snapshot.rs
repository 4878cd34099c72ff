//! Immutable captures of canvas state.
//!
//! A [`CanvasSnapshot`] is cheap to clone: the captured state sits behind an
//! `Arc` and is never mutated after capture. Capturing copies the live display
//! list (including every point vector), so nothing drawn afterwards can leak
//! into a stored snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::render::backend::SurfaceSize;
use crate::render::{DisplayItem, RenderList};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CanvasState {
    width: u32,
    height: u32,
    items: Vec<DisplayItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    state: Arc<CanvasState>,
}

impl CanvasSnapshot {
    /// Captures `list` as drawn on a surface of `size`.
    pub fn capture(list: &RenderList, size: SurfaceSize) -> Self {
        Self {
            state: Arc::new(CanvasState {
                width: size.width,
                height: size.height,
                items: list.items.clone(),
            }),
        }
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.state.items
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.state.width, self.state.height)
    }

    /// Fresh, independently owned display list with the captured items.
    pub fn to_render_list(&self) -> RenderList {
        RenderList {
            items: self.state.items.clone(),
        }
    }

    /// True when both snapshots share the same captured state.
    pub fn ptr_eq(a: &CanvasSnapshot, b: &CanvasSnapshot) -> bool {
        Arc::ptr_eq(&a.state, &b.state)
    }
}
