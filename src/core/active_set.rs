//! The active file list and its cursor.
//!
//! The engine never iterates over this list while mutating it.  It reads the
//! entry under the cursor, decides, then either moves the cursor or removes
//! that entry.  Removal compacts the `Vec` in place, so after a removal the
//! cursor already names the next candidate.

use std::path::{Path, PathBuf};

/// Ordered file names (relative to the source root) still awaiting a decision,
/// plus the cursor into them.
///
/// Invariant: `cursor <= entries.len()`.  `cursor == len` means every entry
/// has been visited.
#[derive(Debug, Clone, Default)]
pub struct ActiveFileSet {
    entries: Vec<PathBuf>,
    cursor: usize,
}

impl ActiveFileSet {
    /// Build from a listing.  Duplicates are dropped, keeping the first.
    pub fn new(entries: Vec<PathBuf>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.clone()))
            .collect();
        Self { entries, cursor: 0 }
    }

    /// The entry under the cursor, or `None` once past the last one.
    pub fn current(&self) -> Option<&Path> {
        self.entries.get(self.cursor).map(PathBuf::as_path)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` once the cursor has moved past the last entry.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn advance(&mut self) {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
    }

    /// Step back one entry.  A no-op at the first entry.
    pub fn back(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Remove the entry under the cursor.  The cursor keeps its index, which
    /// now names the entry that followed the removed one.
    pub fn remove_current(&mut self) -> Option<PathBuf> {
        if self.cursor >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(self.cursor);
        self.cursor = self.cursor.min(self.entries.len());
        Some(removed)
    }
}
