//! Undo/redo history over canvas snapshots.
//!
//! [`HistoryStore`] is an ordered stack of [`CanvasSnapshot`]s with a cursor.
//! The cursor either points at the current entry or sits before the first
//! entry (`None`), which is the state of an empty or fully undone history.
//!
//! Recording after an undo discards the redo branch (everything after the
//! cursor), never the entries before it.
//!
//! Cloning a store produces a detached timeline: the snapshots are shared
//! (they are immutable), the stack and cursor are not.
//!
//! ```
//! use grimpan::history::HistoryStore;
//! use grimpan::render::{RenderList, backend::SurfaceSize};
//! use grimpan::snapshot::CanvasSnapshot;
//!
//! let snap = CanvasSnapshot::capture(&RenderList::new(), SurfaceSize::new(1, 1));
//! let mut history = HistoryStore::new();
//! history.record(snap.clone());
//!
//! let mut preview = history.clone();
//! preview.undo().unwrap();
//! assert_eq!(history.cursor(), Some(0));
//! assert_eq!(preview.cursor(), None);
//! ```

use crate::engine::errors::{EngineError, HistoryDirection};
use crate::engine::snapshot::CanvasSnapshot;

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<CanvasSnapshot>,
    /// Index of the current entry; `None` is "before the first entry".
    cursor: Option<usize>,
    /// Oldest entries are dropped once the stack grows past this bound.
    max_entries: Option<usize>,
}

impl HistoryStore {
    /// Creates an empty, unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history that keeps at most `max_entries` snapshots.
    /// A bound of zero is treated as one.
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::default()
        }
    }

    /// Appends `snapshot` after the cursor, discarding any redo branch, and
    /// makes it current.
    pub fn record(&mut self, snapshot: CanvasSnapshot) {
        let keep = self.cursor.map(|c| c + 1).unwrap_or(0);
        if keep < self.entries.len() {
            log::debug!("history: discarding {} redo entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }

        self.entries.push(snapshot);

        if let Some(max) = self.max_entries {
            if self.entries.len() > max {
                let excess = self.entries.len() - max;
                self.entries.drain(..excess);
            }
        }

        self.cursor = Some(self.entries.len() - 1);
    }

    /// Moves the cursor back one entry.
    ///
    /// Returns the snapshot that is now current, or `None` when the cursor
    /// moved onto the sentinel. Undoing while already at the sentinel fails
    /// with [`EngineError::HistoryBoundary`] and changes nothing.
    pub fn undo(&mut self) -> Result<Option<CanvasSnapshot>, EngineError> {
        match self.cursor {
            None => Err(EngineError::HistoryBoundary(HistoryDirection::Undo)),
            Some(0) => {
                self.cursor = None;
                Ok(None)
            }
            Some(c) => {
                self.cursor = Some(c - 1);
                Ok(Some(self.entries[c - 1].clone()))
            }
        }
    }

    /// Moves the cursor forward one entry and returns the snapshot now current.
    ///
    /// Fails with [`EngineError::HistoryBoundary`] when the cursor is already
    /// on the last entry (or the history is empty).
    pub fn redo(&mut self) -> Result<CanvasSnapshot, EngineError> {
        let next = self.cursor.map(|c| c + 1).unwrap_or(0);
        match self.entries.get(next) {
            Some(snapshot) => {
                self.cursor = Some(next);
                Ok(snapshot.clone())
            }
            None => Err(EngineError::HistoryBoundary(HistoryDirection::Redo)),
        }
    }

    /// Snapshot under the cursor, if any.
    pub fn current(&self) -> Option<&CanvasSnapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map(|c| c + 1).unwrap_or(0) < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// All entries in recording order, including the redo branch.
    pub fn iter(&self) -> impl Iterator<Item = &CanvasSnapshot> {
        self.entries.iter()
    }

    /// Drops every entry and resets the cursor to the sentinel.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::SurfaceSize;
    use crate::render::{Color, DisplayItem, RenderList};

    fn snap(n: u8) -> CanvasSnapshot {
        let mut list = RenderList::new();
        list.add_command(DisplayItem::Clear { color: Color::from_u8(n, n, n, 255) });
        CanvasSnapshot::capture(&list, SurfaceSize::new(4, 4))
    }

    fn boundary(err: EngineError, dir: HistoryDirection) -> bool {
        matches!(err, EngineError::HistoryBoundary(d) if d == dir)
    }

    #[test]
    fn undo_walks_back_to_sentinel_then_fails() {
        let mut h = HistoryStore::new();
        for n in 1..=3 {
            h.record(snap(n));
        }

        assert_eq!(h.undo().unwrap(), Some(snap(2)));
        assert_eq!(h.undo().unwrap(), Some(snap(1)));
        assert_eq!(h.undo().unwrap(), None);
        assert_eq!(h.cursor(), None);

        let err = h.undo().unwrap_err();
        assert!(boundary(err, HistoryDirection::Undo));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn undo_on_empty_history_fails() {
        let mut h = HistoryStore::new();
        assert!(boundary(h.undo().unwrap_err(), HistoryDirection::Undo));
        assert!(boundary(h.redo().unwrap_err(), HistoryDirection::Redo));
    }

    #[test]
    fn redo_replays_until_last_entry() {
        let mut h = HistoryStore::new();
        h.record(snap(1));
        h.record(snap(2));
        h.undo().unwrap();
        h.undo().unwrap();

        assert_eq!(h.redo().unwrap(), snap(1));
        assert_eq!(h.redo().unwrap(), snap(2));
        assert!(boundary(h.redo().unwrap_err(), HistoryDirection::Redo));
        assert_eq!(h.cursor(), Some(1));
    }

    #[test]
    fn record_after_undo_discards_only_redo_branch() {
        let mut h = HistoryStore::new();
        for n in 1..=4 {
            h.record(snap(n));
        }
        h.undo().unwrap();
        h.undo().unwrap();

        h.record(snap(9));
        assert_eq!(h.len(), 3);
        assert_eq!(h.current(), Some(&snap(9)));
        assert!(!h.can_redo());
        assert!(boundary(h.redo().unwrap_err(), HistoryDirection::Redo));

        let entries: Vec<_> = h.iter().cloned().collect();
        assert_eq!(entries, vec![snap(1), snap(2), snap(9)]);
    }

    #[test]
    fn record_from_sentinel_replaces_everything() {
        let mut h = HistoryStore::new();
        h.record(snap(1));
        h.record(snap(2));
        h.undo().unwrap();
        h.undo().unwrap();

        h.record(snap(7));
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), Some(0));
    }

    #[test]
    fn clone_is_detached_from_original() {
        let mut h = HistoryStore::new();
        h.record(snap(1));
        h.record(snap(2));

        let mut fork = h.clone();
        fork.undo().unwrap();
        fork.record(snap(5));
        fork.record(snap(6));

        assert_eq!(h.len(), 2);
        assert_eq!(h.cursor(), Some(1));
        assert_eq!(h.current(), Some(&snap(2)));
        assert_eq!(fork.len(), 3);

        // Contents are shared, not copied
        let original_first = h.iter().next().unwrap();
        let fork_first = fork.iter().next().unwrap();
        assert!(CanvasSnapshot::ptr_eq(original_first, fork_first));
    }

    #[test]
    fn repeated_clones_leave_source_untouched() {
        let mut h = HistoryStore::new();
        h.record(snap(1));
        for _ in 0..5 {
            let _ = h.clone();
        }
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), Some(0));
    }

    #[test]
    fn limit_drops_oldest_entries() {
        let mut h = HistoryStore::with_limit(2);
        h.record(snap(1));
        h.record(snap(2));
        h.record(snap(3));

        assert_eq!(h.len(), 2);
        assert_eq!(h.cursor(), Some(1));
        assert_eq!(h.undo().unwrap(), Some(snap(2)));
        assert_eq!(h.undo().unwrap(), None);
    }

    #[test]
    fn clear_resets_to_sentinel() {
        let mut h = HistoryStore::new();
        h.record(snap(1));
        h.clear();
        assert!(h.is_empty());
        assert!(!h.can_undo());
        assert!(h.current().is_none());
    }
}
