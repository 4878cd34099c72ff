//! Render list and display items.
//!
//! The live canvas state is a vector list of [`DisplayItem`] commands rather
//! than a pixel buffer. Backends replay the list onto their surface, and
//! snapshots capture a deep copy of it.
//!
//! # Example
//!
//! ```rust
//! use grimpan::render::{RenderList, DisplayItem, Color, Point};
//!
//! let mut list = RenderList::new();
//!
//! list.add_command(DisplayItem::Clear { color: Color::from_u8(255, 255, 255, 255) });
//! list.add_command(DisplayItem::Stroke {
//!     points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
//!     width: 2.0,
//!     color: Color::from_u8(0, 0, 0, 255),
//! });
//! assert_eq!(list.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// RGBA color used for drawing commands.
///
/// Channels are represented as `f32` in the range `0.0 ..= 1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel (opacity)
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    /// Creates a new color from `f32` channel values in the range `0.0 ..= 1.0`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }

    /// Creates a new color from `u8` channel values in the range `0 ..= 255`.
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Returns the color as four `u8` channels (RGBA order).
    pub fn to_u8(&self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    /// True when the color is not fully opaque.
    pub fn is_translucent(&self) -> bool {
        self.a < 1.0
    }
}

/// A point on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A single display item representing a drawing command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DisplayItem {
    /// Clear the entire surface with the given color.
    Clear {
        color: Color,
    },

    /// Freehand pen stroke through `points`.
    Stroke {
        points: Vec<Point>,
        width: f32,
        color: Color,
    },

    /// Eraser path through `points`.
    Erase {
        points: Vec<Point>,
        width: f32,
    },

    /// Circle centered at `center` with radius `radius`.
    Circle {
        center: Point,
        radius: f32,
        color: Color,
    },

    /// Filled rectangle at `(x, y)` with width `w` and height `h`.
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
}

impl DisplayItem {
    /// Color this item paints with, if any. Erasing paints nothing.
    pub fn color(&self) -> Option<Color> {
        match self {
            DisplayItem::Clear { color }
            | DisplayItem::Stroke { color, .. }
            | DisplayItem::Circle { color, .. }
            | DisplayItem::Rect { color, .. } => Some(*color),
            DisplayItem::Erase { .. } => None,
        }
    }

    /// True when `p` lies on the area this item paints.
    ///
    /// Paths use their bounding box grown by half the line width, which is
    /// good enough for picking.
    pub fn contains(&self, p: Point) -> bool {
        match self {
            DisplayItem::Clear { .. } => true,
            DisplayItem::Stroke { points, width, .. } | DisplayItem::Erase { points, width } => {
                let half = width / 2.0;
                !points.is_empty()
                    && p.x >= points.iter().map(|q| q.x).fold(f32::INFINITY, f32::min) - half
                    && p.x <= points.iter().map(|q| q.x).fold(f32::NEG_INFINITY, f32::max) + half
                    && p.y >= points.iter().map(|q| q.y).fold(f32::INFINITY, f32::min) - half
                    && p.y <= points.iter().map(|q| q.y).fold(f32::NEG_INFINITY, f32::max) + half
            }
            DisplayItem::Circle { center, radius, .. } => {
                let (dx, dy) = (p.x - center.x, p.y - center.y);
                dx * dx + dy * dy <= radius * radius
            }
            DisplayItem::Rect { x, y, w, h, .. } => {
                p.x >= *x && p.x <= x + w && p.y >= *y && p.y <= y + h
            }
        }
    }
}

/// A list of display items to be rendered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderList {
    /// Sequence of drawing commands to execute.
    pub items: Vec<DisplayItem>,
}

impl RenderList {
    /// Creates a new, empty render list.
    pub fn new() -> Self {
        RenderList { items: Vec::new() }
    }

    /// Adds a new display item (drawing command) to the list.
    pub fn add_command(&mut self, command: DisplayItem) {
        // A clear wipes everything painted before it.
        if matches!(command, DisplayItem::Clear { .. }) {
            self.items.clear();
        }
        self.items.push(command);
    }

    /// Clears all display items from the list.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Color of the most recent clear, or white when the list was never cleared.
    pub fn background(&self) -> Color {
        self.items
            .iter()
            .rev()
            .find_map(|item| match item {
                DisplayItem::Clear { color } => Some(*color),
                _ => None,
            })
            .unwrap_or(Color::WHITE)
    }

    /// Color visible at `p`: the topmost item covering it, or the background.
    /// An eraser on top reveals the background.
    pub fn color_at(&self, p: Point) -> Color {
        self.items
            .iter()
            .rev()
            .find(|item| item.contains(p))
            .and_then(|item| item.color())
            .unwrap_or_else(|| self.background())
    }
}
