#![forbid(unsafe_code)]

//! Linear snapshot history with a cursor and per-entry checkpoints.
//!
//! [`HistoryStore`] keeps one full copy of the element sequence per recorded
//! state. A cursor selects the current entry; navigation only moves the
//! cursor, and recording a mutation discards everything after it.
//!
//! # Architecture
//!
//! ```text
//! record(s3)
//! ┌────────────────────────────────────────────┐
//! │ Entries: [s0, s1, s2, s3]                  │
//! │ Cursor:                ^                   │
//! └────────────────────────────────────────────┘
//!
//! undo(2)
//! ┌────────────────────────────────────────────┐
//! │ Entries: [s0, s1, s2, s3]                  │
//! │ Cursor:       ^                            │
//! └────────────────────────────────────────────┘
//!
//! record(s4): truncates s2, s3
//! ┌────────────────────────────────────────────┐
//! │ Entries: [s0, s1, s4]                      │
//! │ Cursor:           ^                        │
//! └────────────────────────────────────────────┘
//! ```
//!
//! Checkpoints hang off individual entries. They are visible only while the
//! cursor sits on their entry and disappear with it when the entry is
//! truncated, cleaned or evicted.
//!
//! # Invariants
//!
//! 1. `entries` is never empty.
//! 2. `cursor < entries.len()` after every operation.
//! 3. After `record`, `cursor == entries.len() - 1`.
//! 4. `entries.len() <= max_entries` after `record` and `replace_entries`.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::checkpoint::{self, Checkpoint};
use crate::error::{HistoryError, ParseError, Result};

const TARGET: &str = "revlist.history";

/// One recorded state: a full copy of the elements plus its checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    /// Elements at the time the entry was recorded.
    pub items: Vec<T>,
    /// Checkpoints saved while this entry was current.
    pub checkpoints: Vec<Checkpoint<T>>,
}

impl<T> HistoryEntry<T> {
    /// Entry with no checkpoints.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            checkpoints: Vec::new(),
        }
    }
}

/// Ordered history entries and the cursor into them.
#[derive(Clone)]
pub struct HistoryStore<T> {
    entries: VecDeque<HistoryEntry<T>>,
    cursor: usize,
    max_entries: Option<usize>,
}

impl<T> fmt::Debug for HistoryStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl<T: Clone> HistoryStore<T> {
    /// Start a history whose only entry is a copy of `initial`.
    #[must_use]
    pub fn new(initial: &[T]) -> Self {
        Self::with_limit(initial, None)
    }

    /// Start a history that keeps at most `max_entries` entries.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub fn with_limit(initial: &[T], max_entries: Option<usize>) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(HistoryEntry::new(initial.to_vec()));
        Self {
            entries,
            cursor: 0,
            max_entries: max_entries.map(|n| n.max(1)),
        }
    }

    // ====================================================================
    // Recording
    // ====================================================================

    /// Record `items` as the newest entry.
    ///
    /// Entries after the cursor are discarded first, then the depth limit
    /// evicts the oldest entries.
    pub fn record(&mut self, items: &[T]) {
        let discarded = self.entries.len() - (self.cursor + 1);
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(HistoryEntry::new(items.to_vec()));
        self.cursor = self.entries.len() - 1;
        let evicted = self.enforce_depth();
        debug!(
            target: TARGET,
            cursor = self.cursor,
            entries = self.entries.len(),
            discarded,
            evicted,
            "recorded mutation"
        );
    }

    // ====================================================================
    // Navigation
    // ====================================================================

    /// Step back one entry. Returns `None` when already at the oldest.
    pub fn previous(&mut self) -> Option<&[T]> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        debug!(target: TARGET, cursor = self.cursor, "previous");
        Some(self.current_items())
    }

    /// Step forward one entry. Returns `None` when already at the newest.
    pub fn next(&mut self) -> Option<&[T]> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        debug!(target: TARGET, cursor = self.cursor, "next");
        Some(self.current_items())
    }

    /// Move the cursor by `offset` entries.
    ///
    /// Fails without moving when the target falls outside the history.
    pub fn jump(&mut self, offset: isize) -> Result<&[T]> {
        let target = isize::try_from(self.cursor)
            .ok()
            .and_then(|c| c.checked_add(offset))
            .unwrap_or(isize::MIN);
        let index = self.check_index(target)?;
        self.cursor = index;
        debug!(target: TARGET, offset, cursor = self.cursor, "jump");
        Ok(self.current_items())
    }

    /// Move the cursor to `index`.
    ///
    /// Fails without moving when `index` is not a valid entry.
    pub fn go_to(&mut self, index: usize) -> Result<&[T]> {
        let target = isize::try_from(index).unwrap_or(isize::MAX);
        self.cursor = self.check_index(target)?;
        debug!(target: TARGET, cursor = self.cursor, "go_to");
        Ok(self.current_items())
    }

    /// Step back up to `times` entries, stopping at the oldest.
    pub fn undo(&mut self, times: usize) -> &[T] {
        self.cursor = self.cursor.saturating_sub(times);
        debug!(target: TARGET, times, cursor = self.cursor, "undo");
        self.current_items()
    }

    /// Step forward up to `times` entries, stopping at the newest.
    pub fn redo(&mut self, times: usize) -> &[T] {
        self.cursor = self.cursor.saturating_add(times).min(self.last_index());
        debug!(target: TARGET, times, cursor = self.cursor, "redo");
        self.current_items()
    }

    fn check_index(&self, target: isize) -> Result<usize> {
        usize::try_from(target)
            .ok()
            .filter(|&i| i < self.entries.len())
            .ok_or(HistoryError::OutOfRange {
                target,
                len: self.entries.len(),
            })
    }

    // ====================================================================
    // Maintenance
    // ====================================================================

    /// Collapse the history to a single entry holding `items`.
    pub fn clean(&mut self, items: &[T]) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.entries.push_back(HistoryEntry::new(items.to_vec()));
        self.cursor = 0;
        debug!(target: TARGET, dropped, "clean");
    }

    /// Keep only the `size` most recent entries and move the cursor to the
    /// newest. A size of zero is treated as one.
    ///
    /// Returns whether any entry was dropped.
    pub fn limit(&mut self, size: usize) -> bool {
        let size = size.max(1);
        if size >= self.entries.len() {
            return false;
        }
        let excess = self.entries.len() - size;
        self.entries.drain(..excess);
        self.cursor = self.last_index();
        debug!(target: TARGET, size, dropped = excess, "limit");
        true
    }

    /// Replace every entry; the cursor moves to the newest.
    ///
    /// An empty list is rejected and leaves the store untouched.
    pub fn replace_entries(&mut self, entries: Vec<HistoryEntry<T>>) -> Result<(), ParseError> {
        if entries.is_empty() {
            return Err(ParseError::EmptyHistory);
        }
        self.entries = entries.into();
        self.cursor = self.last_index();
        self.enforce_depth();
        debug!(target: TARGET, entries = self.entries.len(), "replaced entries");
        Ok(())
    }

    /// Evict the oldest entries beyond the depth limit. Returns how many.
    fn enforce_depth(&mut self) -> usize {
        let Some(max) = self.max_entries else {
            return 0;
        };
        let mut evicted = 0;
        while self.entries.len() > max {
            self.entries.pop_front();
            evicted += 1;
        }
        self.cursor = self.cursor.saturating_sub(evicted);
        evicted
    }

    // ====================================================================
    // Checkpoints
    // ====================================================================

    /// Attach a checkpoint holding `items` to the current entry.
    pub fn save_checkpoint(&mut self, label: Option<String>, items: Vec<T>) {
        let cursor = self.cursor;
        let entry = self.current_mut();
        entry.checkpoints.push(Checkpoint { label, items });
        debug!(
            target: TARGET,
            cursor,
            checkpoints = entry.checkpoints.len(),
            "saved checkpoint"
        );
    }

    /// First checkpoint on the current entry labelled `label`.
    #[must_use]
    pub fn checkpoint(&self, label: &str) -> Option<&Checkpoint<T>> {
        checkpoint::find(&self.current().checkpoints, label)
    }

    /// Remove the first checkpoint on the current entry labelled `label`.
    pub fn remove_checkpoint(&mut self, label: &str) -> bool {
        let removed = checkpoint::remove_first(&mut self.current_mut().checkpoints, label);
        debug!(target: TARGET, label, removed = removed.is_some(), "remove checkpoint");
        removed.is_some()
    }

    /// Checkpoints of the current entry.
    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint<T>] {
        &self.current().checkpoints
    }

    // ====================================================================
    // Query
    // ====================================================================

    /// Index of the current entry.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the cursor can move back.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether the cursor can move forward.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.last_index()
    }

    /// The configured depth limit.
    #[must_use]
    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &VecDeque<HistoryEntry<T>> {
        &self.entries
    }

    /// The entry under the cursor.
    #[must_use]
    pub fn current(&self) -> &HistoryEntry<T> {
        &self.entries[self.cursor]
    }

    /// Elements of the entry under the cursor.
    #[must_use]
    pub fn current_items(&self) -> &[T] {
        &self.current().items
    }

    fn current_mut(&mut self) -> &mut HistoryEntry<T> {
        &mut self.entries[self.cursor]
    }

    fn last_index(&self) -> usize {
        self.entries.len() - 1
    }
}

impl<T: Clone + PartialEq> HistoryStore<T> {
    /// Whether `items` differs from the current entry, by length or at any
    /// position.
    #[must_use]
    pub fn differs_from(&self, items: &[T]) -> bool {
        self.current_items() != items
    }
}

// ============================================================================
// Tests
// ============================================================================
