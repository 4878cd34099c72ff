//! Drawing-session engine.
//!
//! A [`SessionRegistry`] hands out one [`Session`] per backend kind. Each
//! session draws on a host canvas through a render backend, keeps an
//! undo/redo history of snapshots, and announces what it does on a shared
//! notification bus that menus and autosave workers listen to.

pub mod engine;
pub mod render;

pub use engine::*;
