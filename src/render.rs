pub mod backend;

/// Drawing backends for the engine.
pub mod backends {
    /// Limited 2D context backend (no paths, no alpha)
    pub mod legacy;
    /// Full 2D context backend
    pub mod modern;
}

mod canvas;
pub use canvas::Canvas;

mod render_list;
pub use render_list::*;
