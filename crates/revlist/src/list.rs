#![forbid(unsafe_code)]

//! The public versioned list.
//!
//! [`VersionedList<T>`] is a shared handle (`Rc<RefCell<..>>`) over a
//! [`ValidatedSequence`], its [`HistoryStore`] and a [`NotificationHub`].
//! Cloning the handle shares all three.
//!
//! # Sequencing
//!
//! Every mutation runs in three steps, always in this order:
//!
//! 1. apply the change to the live sequence,
//! 2. record a full copy as a new history entry (truncating any redo
//!    future),
//! 3. release the internal borrow and broadcast the event with a copy of
//!    the resulting elements.
//!
//! Navigation replaces the live elements with a copy of the selected entry
//! and then broadcasts. Because no borrow is held during step 3, listeners
//! may call back into the list.
//!
//! # Failure Modes
//!
//! - Calling a mutating method from inside [`with`](VersionedList::with)
//!   panics (the closure holds an immutable borrow).
//! - A validator that calls back into the list panics (the live sequence
//!   is mutably borrowed while it runs).
//! - A panicking listener propagates to the caller. History is already
//!   updated at that point.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::checkpoint::Checkpoint;
use crate::config::ListConfig;
use crate::deferred::DeferredCommandQueue;
use crate::error::{ConfigError, Result};
use crate::event::ChangeEvent;
use crate::history::{HistoryEntry, HistoryStore};
use crate::notify::{NotificationHub, Subscription};
use crate::sequence::{ValidatedSequence, Validator};
use crate::serialize::{self, CsvOptions};

struct ListState<T> {
    sequence: ValidatedSequence<T>,
    history: HistoryStore<T>,
    config: ListConfig,
}

impl<T: Clone> ListState<T> {
    /// Copy the current history entry into the live sequence.
    fn reload(&mut self) {
        self.sequence.replace(self.history.current_items().to_vec());
    }

    fn snapshot(&self) -> Vec<T> {
        self.sequence.items().to_vec()
    }
}

/// Ordered elements with validation, undo/redo history, checkpoints and
/// change notification.
///
/// # Invariants
///
/// 1. The history always holds at least one entry and the cursor points at
///    a valid one.
/// 2. Mutations always record, even when a validator filtered out every
///    appended element.
/// 3. Snapshots handed to listeners and returned from navigation are
///    copies; mutating them never affects recorded history.
pub struct VersionedList<T> {
    state: Rc<RefCell<ListState<T>>>,
    hub: Rc<NotificationHub<T>>,
}

impl<T> Clone for VersionedList<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            hub: Rc::clone(&self.hub),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for VersionedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VersionedList")
            .field("items", &state.sequence.items())
            .field("history", &state.history)
            .field("hub", &self.hub)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for VersionedList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Clone + PartialEq + 'static> VersionedList<T> {
    /// Create a list holding `items`, with no validator.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self::build(items, None, ListConfig::default())
    }

    /// Create a list whose appends are filtered by `validator`.
    ///
    /// `items` themselves are not validated.
    #[must_use]
    pub fn with_validator(items: Vec<T>, validator: impl Fn(&T) -> bool + 'static) -> Self {
        Self::build(items, Some(Rc::new(validator)), ListConfig::default())
    }

    /// Create a list with an explicit configuration.
    ///
    /// The configuration is checked with [`ListConfig::validate`] first, the
    /// same way the file loaders check it; a zero `max_entries` or an empty
    /// `csv_delimiter` fails with [`ConfigError::Validation`].
    pub fn with_config(
        items: Vec<T>,
        validator: Option<Validator<T>>,
        config: ListConfig,
    ) -> std::result::Result<Self, ConfigError> {
        let config = config.validated()?;
        Ok(Self::build(items, validator, config))
    }

    fn build(items: Vec<T>, validator: Option<Validator<T>>, config: ListConfig) -> Self {
        let history = HistoryStore::with_limit(&items, config.max_entries);
        Self {
            state: Rc::new(RefCell::new(ListState {
                sequence: ValidatedSequence::new(items, validator),
                history,
                config,
            })),
            hub: Rc::new(NotificationHub::new()),
        }
    }

    // ====================================================================
    // Plumbing
    // ====================================================================

    /// Run `f` on the live sequence, record the result and broadcast.
    fn mutate<R>(&self, event: ChangeEvent, f: impl FnOnce(&mut ValidatedSequence<T>) -> R) -> R {
        debug_assert!(event.is_mutation(), "{event} does not record");
        let (result, snapshot) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let result = f(&mut state.sequence);
            state.history.record(state.sequence.items());
            (result, state.snapshot())
        };
        self.hub.broadcast(event, &snapshot);
        result
    }

    /// Run `f` on the whole state without recording, then broadcast the
    /// live elements.
    fn navigate<R>(
        &self,
        event: ChangeEvent,
        f: impl FnOnce(&mut ListState<T>) -> R,
    ) -> (R, Vec<T>) {
        let (result, snapshot) = {
            let mut state = self.state.borrow_mut();
            let result = f(&mut state);
            (result, state.snapshot())
        };
        self.hub.broadcast(event, &snapshot);
        (result, snapshot)
    }

    // ====================================================================
    // Live elements
    // ====================================================================

    /// Copy of the live elements.
    #[must_use]
    pub fn get(&self) -> Vec<T> {
        self.state.borrow().snapshot()
    }

    /// Borrow the live elements without copying.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(self.state.borrow().sequence.items())
    }

    /// Copy of the configuration.
    #[must_use]
    pub fn config(&self) -> ListConfig {
        self.state.borrow().config.clone()
    }

    /// Overwrite the element at `index` in place, returning the previous
    /// value, or `None` when `index` is out of bounds.
    ///
    /// This is a plain indexed write: it is neither recorded nor broadcast,
    /// so the live elements drift from the current entry until the next
    /// mutation records them. [`has_changes`](Self::has_changes) reports the
    /// drift.
    pub fn set(&self, index: usize, value: T) -> Option<T> {
        let mut state = self.state.borrow_mut();
        state.sequence.set(index, value)
    }

    /// Replace the admission predicate. Existing elements are not
    /// re-checked.
    pub fn set_validation(&self, validator: impl Fn(&T) -> bool + 'static) {
        self.state
            .borrow_mut()
            .sequence
            .set_validator(Some(Rc::new(validator)));
    }

    /// Remove the admission predicate.
    pub fn clear_validation(&self) {
        self.state.borrow_mut().sequence.set_validator(None);
    }

    // ====================================================================
    // Mutations
    // ====================================================================

    /// Append one element if it passes validation. Returns the new length.
    pub fn push(&self, item: T) -> usize {
        self.mutate(ChangeEvent::Add, |s| s.push_all([item]))
    }

    /// Append every element that passes validation, in order. Returns the
    /// new length.
    pub fn push_all(&self, items: impl IntoIterator<Item = T>) -> usize {
        self.mutate(ChangeEvent::BatchAdd, |s| s.push_all(items))
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<T> {
        self.mutate(ChangeEvent::Remove, ValidatedSequence::pop)
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<T> {
        self.mutate(ChangeEvent::Shift, ValidatedSequence::shift)
    }

    /// Prepend `items` in order. Returns the new length.
    pub fn unshift(&self, items: Vec<T>) -> usize {
        self.mutate(ChangeEvent::Unshift, |s| s.unshift(items))
    }

    /// Remove `delete_count` elements at `start` (all remaining when
    /// `None`), insert `items`, and return the removed elements.
    pub fn splice(&self, start: isize, delete_count: Option<usize>, items: Vec<T>) -> Vec<T> {
        self.mutate(ChangeEvent::Splice, |s| s.splice(start, delete_count, items))
    }

    /// Reverse in place and return the result.
    pub fn reverse(&self) -> Vec<T> {
        self.mutate(ChangeEvent::Reverse, |s| s.reverse().to_vec())
    }

    /// Stable sort with `compare` and return the result.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
        self.mutate(ChangeEvent::Sort, |s| s.sort_by(compare).to_vec())
    }

    /// Overwrite `start..end` with `value` and return the result.
    pub fn fill(&self, value: T, start: Option<isize>, end: Option<isize>) -> Vec<T> {
        self.mutate(ChangeEvent::Fill, |s| s.fill(value, start, end).to_vec())
    }

    /// Copy `start..end` to `target` and return the result.
    pub fn copy_within(&self, target: isize, start: isize, end: Option<isize>) -> Vec<T> {
        self.mutate(ChangeEvent::CopyWithin, |s| {
            s.copy_within(target, start, end).to_vec()
        })
    }

    // ====================================================================
    // History navigation
    // ====================================================================

    /// Step back one entry. At the oldest entry the live elements are
    /// returned unchanged.
    pub fn previous(&self) -> Vec<T> {
        self.navigate(ChangeEvent::Previous, |state| {
            if state.history.previous().is_some() {
                state.reload();
            }
        })
        .1
    }

    /// Step forward one entry. At the newest entry the live elements are
    /// returned unchanged.
    pub fn next(&self) -> Vec<T> {
        self.navigate(ChangeEvent::Next, |state| {
            if state.history.next().is_some() {
                state.reload();
            }
        })
        .1
    }

    /// Move the cursor by `offset` entries.
    ///
    /// An out-of-range target fails with
    /// [`HistoryError::OutOfRange`](crate::HistoryError::OutOfRange), changes
    /// nothing and notifies no one.
    pub fn jump(&self, offset: isize) -> Result<Vec<T>> {
        {
            let mut state = self.state.borrow_mut();
            state.history.jump(offset)?;
            state.reload();
        }
        Ok(self.navigate(ChangeEvent::Jump, |_| ()).1)
    }

    /// Move the cursor to entry `index`.
    ///
    /// An out-of-range index fails like [`jump`](Self::jump).
    pub fn go_to(&self, index: usize) -> Result<Vec<T>> {
        {
            let mut state = self.state.borrow_mut();
            state.history.go_to(index)?;
            state.reload();
        }
        Ok(self.navigate(ChangeEvent::GoTo, |_| ()).1)
    }

    /// Step back up to `times` entries, stopping at the oldest.
    pub fn undo(&self, times: usize) -> Vec<T> {
        self.navigate(ChangeEvent::Undo, |state| {
            state.history.undo(times);
            state.reload();
        })
        .1
    }

    /// Step forward up to `times` entries, stopping at the newest.
    pub fn redo(&self, times: usize) -> Vec<T> {
        self.navigate(ChangeEvent::Redo, |state| {
            state.history.redo(times);
            state.reload();
        })
        .1
    }

    // ====================================================================
    // History maintenance
    // ====================================================================

    /// Drop all history; the live elements become the only entry.
    pub fn clean(&self) {
        self.navigate(ChangeEvent::Clean, |state| {
            let ListState { sequence, history, .. } = state;
            history.clean(sequence.items());
        });
    }

    /// Keep only the `size` most recent entries (at least one).
    ///
    /// The cursor moves to the newest entry; if it was elsewhere, the live
    /// elements are reloaded from it. Notifies only when entries were
    /// dropped.
    pub fn limit(&self, size: usize) -> bool {
        let (truncated, snapshot) = {
            let mut state = self.state.borrow_mut();
            let was_at_head = !state.history.can_redo();
            let truncated = state.history.limit(size);
            if truncated && !was_at_head {
                state.reload();
            }
            (truncated, state.snapshot())
        };
        if truncated {
            self.hub.broadcast(ChangeEvent::Limit, &snapshot);
        }
        truncated
    }

    // ====================================================================
    // Checkpoints
    // ====================================================================

    /// Attach a labelled copy of the live elements to the current entry.
    pub fn save_checkpoint(&self, label: &str) {
        self.save_checkpoint_inner(Some(label.to_string()));
    }

    /// Attach an unlabelled copy of the live elements to the current entry.
    pub fn save_unlabeled_checkpoint(&self) {
        self.save_checkpoint_inner(None);
    }

    fn save_checkpoint_inner(&self, label: Option<String>) {
        self.navigate(ChangeEvent::SaveCheckpoint, |state| {
            let items = state.snapshot();
            state.history.save_checkpoint(label, items);
        });
    }

    /// Replace the live elements with the first checkpoint labelled
    /// `label` on the current entry. History is not touched.
    ///
    /// Returns `false`, without notifying, when no such checkpoint exists.
    pub fn restore_checkpoint(&self, label: &str) -> bool {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            let Some(items) = state.history.checkpoint(label).map(|c| c.items.clone()) else {
                debug!(target: "revlist.history", label, "checkpoint not found");
                return false;
            };
            state.sequence.replace(items);
            state.snapshot()
        };
        self.hub.broadcast(ChangeEvent::RestoreCheckpoint, &snapshot);
        true
    }

    /// Remove the first checkpoint labelled `label` from the current entry.
    ///
    /// Returns `false`, without notifying, when no such checkpoint exists.
    pub fn remove_checkpoint(&self, label: &str) -> bool {
        let (removed, snapshot) = {
            let mut state = self.state.borrow_mut();
            (state.history.remove_checkpoint(label), state.snapshot())
        };
        if removed {
            self.hub.broadcast(ChangeEvent::RemoveCheckpoint, &snapshot);
        }
        removed
    }

    /// Checkpoints attached to the current entry.
    #[must_use]
    pub fn list_checkpoints(&self) -> Vec<Checkpoint<T>> {
        self.state.borrow().history.checkpoints().to_vec()
    }

    // ====================================================================
    // History queries
    // ====================================================================

    /// Whether the live elements differ from the current history entry.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        let state = self.state.borrow();
        state.history.differs_from(state.sequence.items())
    }

    /// Index of the current history entry.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.state.borrow().history.cursor()
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.state.borrow().history.len()
    }

    /// Whether [`undo`](Self::undo) would move the cursor.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.state.borrow().history.can_undo()
    }

    /// Whether [`redo`](Self::redo) would move the cursor.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.state.borrow().history.can_redo()
    }

    /// Copy of every history entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry<T>> {
        self.state.borrow().history.entries().iter().cloned().collect()
    }

    /// Copy of the entry under the cursor.
    #[must_use]
    pub fn current_entry(&self) -> HistoryEntry<T> {
        self.state.borrow().history.current().clone()
    }

    // ====================================================================
    // Observation
    // ====================================================================

    /// Register a listener. It is called once right away with
    /// [`ChangeEvent::Initialize`], then after every mutation and
    /// navigation until the returned guard is dropped.
    pub fn subscribe(&self, listener: impl Fn(ChangeEvent, &[T]) + 'static) -> Subscription {
        let snapshot = self.get();
        self.hub.subscribe(&snapshot, listener)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    // ====================================================================
    // Deferred execution
    // ====================================================================

    /// Start recording a chain of operations to run on
    /// [`evaluate`](DeferredCommandQueue::evaluate).
    #[must_use]
    pub fn lazy(&self) -> DeferredCommandQueue<T> {
        DeferredCommandQueue::new(self.clone())
    }
}

impl<T: Clone + Ord + 'static> VersionedList<T> {
    /// Stable sort by natural order and return the result.
    pub fn sort(&self) -> Vec<T> {
        self.mutate(ChangeEvent::Sort, |s| s.sort().to_vec())
    }
}

// ========================================================================
// Serialization
// ========================================================================

impl<T: Clone + PartialEq + Serialize + 'static> VersionedList<T> {
    /// Encode the live elements as a JSON array.
    pub fn serialize(&self) -> serde_json::Result<String> {
        serialize::sequence_to_json(self.state.borrow().sequence.items())
    }

    /// Encode the full history as a JSON array of entries.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serialize::history_to_json(self.state.borrow().history.entries())
    }

    /// Render the history as CSV using the configured delimiter.
    pub fn to_csv(&self) -> serde_json::Result<String> {
        let delimiter = self.state.borrow().config.csv_delimiter.clone();
        self.to_csv_with(&delimiter)
    }

    /// Render the history as CSV with an explicit delimiter.
    pub fn to_csv_with(&self, delimiter: &str) -> serde_json::Result<String> {
        let state = self.state.borrow();
        let opts = CsvOptions {
            delimiter,
            depth: state.config.flatten_depth,
        };
        serialize::history_to_csv(state.history.entries(), opts)
    }

    /// Render the live elements as a single CSV row.
    pub fn sequence_to_csv(&self) -> serde_json::Result<String> {
        let state = self.state.borrow();
        let opts = CsvOptions {
            delimiter: &state.config.csv_delimiter,
            depth: state.config.flatten_depth,
        };
        serialize::sequence_to_csv(state.sequence.items(), opts)
    }
}

impl<T: Clone + PartialEq + DeserializeOwned + 'static> VersionedList<T> {
    /// Replace the live elements with a JSON array.
    ///
    /// Malformed or wrongly shaped text is logged and ignored: the list is
    /// left untouched and `false` is returned. On success the change is
    /// recorded like any other mutation.
    pub fn deserialize(&self, text: &str) -> bool {
        match serialize::parse_sequence(text) {
            Ok(items) => {
                self.mutate(ChangeEvent::Deserialize, |s| s.replace(items));
                true
            }
            Err(err) => {
                warn!(
                    target: "revlist.serialize",
                    error = %err,
                    "deserialize failed; live sequence unchanged"
                );
                false
            }
        }
    }

    /// Replace the whole history with a JSON array of entries.
    ///
    /// The cursor moves to the newest entry and the live elements are
    /// loaded from it. Fails with
    /// [`HistoryError::Parse`](crate::HistoryError::Parse) on malformed
    /// text or an empty array, leaving everything untouched.
    pub fn import(&self, text: &str) -> Result<()> {
        let entries = serialize::parse_history(text)?;
        let snapshot = {
            let mut state = self.state.borrow_mut();
            state.history.replace_entries(entries)?;
            state.reload();
            state.snapshot()
        };
        self.hub.broadcast(ChangeEvent::Import, &snapshot);
        Ok(())
    }
}
