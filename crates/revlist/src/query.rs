#![forbid(unsafe_code)]

//! Read-only queries over the live elements.
//!
//! None of these record history or notify listeners. They borrow the live
//! sequence for the duration of the call, so closures passed in must not
//! mutate the list they are querying.

use std::fmt::Display;

use crate::list::VersionedList;
use crate::sequence::resolve_index;

/// Copy of `items[start..end]` with relative-index resolution.
///
/// `start` defaults to the beginning and `end` to the end; an empty range
/// yields an empty vector.
#[must_use]
pub fn slice_of<T: Clone>(items: &[T], start: Option<isize>, end: Option<isize>) -> Vec<T> {
    let len = items.len();
    let from = resolve_index(start.unwrap_or(0), len);
    let to = end.map_or(len, |e| resolve_index(e, len));
    if from < to {
        items[from..to].to_vec()
    } else {
        Vec::new()
    }
}

impl<T: Clone + PartialEq + 'static> VersionedList<T> {
    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with(<[T]>::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(<[T]>::is_empty)
    }

    /// Element at `index`; negative values count from the end.
    #[must_use]
    pub fn at(&self, index: isize) -> Option<T> {
        self.with(|items| {
            let i = if index < 0 {
                items.len().checked_sub(index.unsigned_abs())?
            } else {
                index.unsigned_abs()
            };
            items.get(i).cloned()
        })
    }

    #[must_use]
    pub fn first(&self) -> Option<T> {
        self.with(|items| items.first().cloned())
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.with(|items| items.last().cloned())
    }

    /// Position of the first element equal to `needle`.
    #[must_use]
    pub fn index_of(&self, needle: &T) -> Option<usize> {
        self.with(|items| items.iter().position(|x| x == needle))
    }

    /// Position of the last element equal to `needle`.
    #[must_use]
    pub fn last_index_of(&self, needle: &T) -> Option<usize> {
        self.with(|items| items.iter().rposition(|x| x == needle))
    }

    #[must_use]
    pub fn includes(&self, needle: &T) -> bool {
        self.with(|items| items.contains(needle))
    }

    /// Positions of every element matching `predicate`, in order.
    pub fn search(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<usize> {
        self.with(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, x)| predicate(x).then_some(i))
                .collect()
        })
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.with(|items| items.iter().find(|x| predicate(x)).cloned())
    }

    pub fn find_index(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.with(|items| items.iter().position(predicate))
    }

    /// Copies of the elements matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.with(|items| items.iter().filter(|x| predicate(x)).cloned().collect())
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Vec<U> {
        self.with(|items| items.iter().map(f).collect())
    }

    /// Left fold over the live elements.
    pub fn reduce<A>(&self, init: A, f: impl FnMut(A, &T) -> A) -> A {
        self.with(|items| items.iter().fold(init, f))
    }

    pub fn some(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.with(|items| items.iter().any(predicate))
    }

    pub fn every(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.with(|items| items.iter().all(predicate))
    }

    /// Copy of a sub-range; see [`slice_of`].
    #[must_use]
    pub fn slice(&self, start: Option<isize>, end: Option<isize>) -> Vec<T> {
        self.with(|items| slice_of(items, start, end))
    }
}

impl<T: Clone + PartialEq + Display + 'static> VersionedList<T> {
    /// Render every element with `Display`, separated by `separator`.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        self.with(|items| {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(separator)
        })
    }
}
