//! Host environment probing.
//!
//! The engine never talks to a document directly. Everything it needs to know
//! about the page it runs in (which drawing APIs exist, whether a canvas
//! element is present) is asked through [`HostEnvironment`]. All queries are
//! read-only.
//!
//! [`StaticHost`] is a fixed description of a host, useful for embedders that
//! already know their environment and for tests:
//!
//! ```
//! use grimpan::host::{Capabilities, HostEnvironment, StaticHost};
//!
//! let host = StaticHost::legacy();
//! assert!(host.capabilities().contains(Capabilities::CONTEXT_2D));
//! assert!(!host.capabilities().contains(Capabilities::PATH_2D));
//! ```

use bitflags::bitflags;
use std::fmt::Display;

use crate::render::backend::SurfaceSize;

bitflags! {
    /// Drawing features a host may expose.
    pub struct Capabilities: u8 {
        const CANVAS_ELEMENT   = 0b0000_0001;
        const CONTEXT_2D       = 0b0000_0010;
        const PATH_2D          = 0b0000_0100;
        const GLOBAL_ALPHA     = 0b0000_1000;
        const OFFSCREEN_CANVAS = 0b0001_0000;
    }
}

impl Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if self.contains(Capabilities::CANVAS_ELEMENT) {
            parts.push("canvas");
        }
        if self.contains(Capabilities::CONTEXT_2D) {
            parts.push("2d-context");
        }
        if self.contains(Capabilities::PATH_2D) {
            parts.push("path2d");
        }
        if self.contains(Capabilities::GLOBAL_ALPHA) {
            parts.push("global-alpha");
        }
        if self.contains(Capabilities::OFFSCREEN_CANVAS) {
            parts.push("offscreen-canvas");
        }

        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}

/// A drawable canvas element found in the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasElement {
    /// Element id (or selector) the host resolved the canvas from
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl CanvasElement {
    pub fn new(id: &str, width: u32, height: u32) -> Self {
        Self {
            id: id.to_string(),
            width,
            height,
        }
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}

/// Read-only view of the environment the engine runs in.
pub trait HostEnvironment: Send + Sync {
    /// User agent of the host, for logging.
    fn user_agent(&self) -> &str;

    /// Drawing features the host supports.
    fn capabilities(&self) -> Capabilities;

    /// The canvas element to draw on, if the document has one.
    fn canvas(&self) -> Option<CanvasElement>;
}

/// A host whose capabilities and canvas are fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticHost {
    user_agent: String,
    capabilities: Capabilities,
    canvas: Option<CanvasElement>,
}

impl StaticHost {
    pub fn new(user_agent: &str, capabilities: Capabilities) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            capabilities,
            canvas: None,
        }
    }

    /// Evergreen browser: every capability and an 800x600 canvas.
    pub fn modern() -> Self {
        Self::new("Mozilla/5.0 (X11; Linux x86_64) Chrome/126.0", Capabilities::all())
            .with_canvas(CanvasElement::new("canvas", 800, 600))
    }

    /// Old browser: a canvas with a bare 2D context.
    pub fn legacy() -> Self {
        Self::new(
            "Mozilla/4.0 (compatible; MSIE 9.0; Windows NT 6.1)",
            Capabilities::CANVAS_ELEMENT | Capabilities::CONTEXT_2D,
        )
        .with_canvas(CanvasElement::new("canvas", 800, 600))
    }

    pub fn with_canvas(mut self, canvas: CanvasElement) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn without_canvas(mut self) -> Self {
        self.canvas = None;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

impl HostEnvironment for StaticHost {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn canvas(&self) -> Option<CanvasElement> {
        self.canvas.clone()
    }
}
