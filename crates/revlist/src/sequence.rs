#![forbid(unsafe_code)]

//! Live element sequence with an optional admission predicate.
//!
//! [`ValidatedSequence`] owns the caller-visible elements and implements the
//! mutation primitives. It knows nothing about history or listeners; the
//! [`VersionedList`](crate::VersionedList) facade records and broadcasts
//! after each call.
//!
//! # Index Resolution
//!
//! Positional arguments follow the conventional relative-index rules: a
//! negative index counts back from the end, and every resolved index is
//! clamped into `0..=len`. `splice(-1, Some(1), vec![])` removes the last
//! element; `fill(v, Some(-2), None)` overwrites the final two.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Admission predicate applied to appended elements.
pub type Validator<T> = Rc<dyn Fn(&T) -> bool>;

/// Resolve a relative index against a sequence of length `len`.
///
/// Negative values count from the end; the result is clamped to `0..=len`.
#[must_use]
pub fn resolve_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

/// Ordered elements plus the predicate that guards appends.
///
/// # Invariants
///
/// 1. The predicate only filters `push`/`push_all`; prepends, splices and
///    fills are never validated.
/// 2. Replacing the predicate never re-checks existing elements.
#[derive(Clone)]
pub struct ValidatedSequence<T> {
    items: Vec<T>,
    validator: Option<Validator<T>>,
}

impl<T: fmt::Debug> fmt::Debug for ValidatedSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedSequence")
            .field("items", &self.items)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

impl<T> ValidatedSequence<T> {
    /// Wrap `items` with an optional predicate.
    ///
    /// The initial elements are taken as-is, not filtered.
    #[must_use]
    pub fn new(items: Vec<T>, validator: Option<Validator<T>>) -> Self {
        Self { items, validator }
    }

    /// Current elements.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace all elements without validation.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Overwrite one element without validation. Returns the old value.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, value))
    }

    /// Replace the admission predicate. Takes effect on the next append.
    pub fn set_validator(&mut self, validator: Option<Validator<T>>) {
        self.validator = validator;
    }

    /// Whether a predicate is installed.
    #[must_use]
    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Whether `item` would pass the admission predicate.
    #[must_use]
    pub fn admits(&self, item: &T) -> bool {
        self.validator.as_ref().is_none_or(|v| v(item))
    }

    // ====================================================================
    // Mutation primitives
    // ====================================================================

    /// Append the elements that pass the predicate, in input order.
    ///
    /// Returns the new length.
    pub fn push_all(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        for item in items {
            if self.admits(&item) {
                self.items.push(item);
            }
        }
        self.items.len()
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Remove and return the first element.
    pub fn shift(&mut self) -> Option<T> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    /// Prepend `items`, keeping their order. Returns the new length.
    pub fn unshift(&mut self, items: Vec<T>) -> usize {
        self.items.splice(0..0, items);
        self.items.len()
    }

    /// Remove `delete_count` elements at `start` (all remaining when
    /// `None`), insert `insert` in their place, and return the removed ones.
    pub fn splice(
        &mut self,
        start: isize,
        delete_count: Option<usize>,
        insert: Vec<T>,
    ) -> Vec<T> {
        let len = self.items.len();
        let start = resolve_index(start, len);
        let remaining = len - start;
        let count = delete_count.map_or(remaining, |n| n.min(remaining));
        self.items.splice(start..start + count, insert).collect()
    }

    /// Reverse in place.
    pub fn reverse(&mut self) -> &[T] {
        self.items.reverse();
        &self.items
    }

    /// Stable sort with a comparator.
    pub fn sort_by(&mut self, mut compare: impl FnMut(&T, &T) -> Ordering) -> &[T] {
        self.items.sort_by(|a, b| compare(a, b));
        &self.items
    }

}

impl<T: Clone> ValidatedSequence<T> {
    /// Overwrite `start..end` with clones of `value`.
    pub fn fill(&mut self, value: T, start: Option<isize>, end: Option<isize>) -> &[T] {
        let len = self.items.len();
        let from = resolve_index(start.unwrap_or(0), len);
        let to = end.map_or(len, |e| resolve_index(e, len));
        if from < to {
            self.items[from..to].fill(value);
        }
        &self.items
    }

    /// Copy `start..end` to position `target` inside the sequence.
    ///
    /// The length never changes; the copied run is truncated at the end of
    /// the sequence. Overlapping ranges behave as if the source were copied
    /// to a temporary first.
    pub fn copy_within(&mut self, target: isize, start: isize, end: Option<isize>) -> &[T] {
        let len = self.items.len();
        let to = resolve_index(target, len);
        let from = resolve_index(start, len);
        let stop = end.map_or(len, |e| resolve_index(e, len));
        let count = stop.saturating_sub(from).min(len - to);
        if count > 0 {
            let run = self.items[from..from + count].to_vec();
            self.items[to..to + count].clone_from_slice(&run);
        }
        &self.items
    }
}

impl<T: Clone + Ord> ValidatedSequence<T> {
    /// Stable sort by the natural order of `T`.
    pub fn sort(&mut self) -> &[T] {
        self.items.sort();
        &self.items
    }
}
