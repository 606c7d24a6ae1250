#![forbid(unsafe_code)]

//! Named snapshots attached to a single history entry.

use serde::{Deserialize, Serialize};

/// A labelled copy of the live elements, saved against one history entry.
///
/// Labels are optional and need not be unique; lookups return the first
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint<T> {
    /// Lookup label.
    pub label: Option<String>,
    /// Elements at the time the checkpoint was saved.
    pub items: Vec<T>,
}

impl<T> Checkpoint<T> {
    /// Create a labelled checkpoint.
    #[must_use]
    pub fn labeled(label: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            label: Some(label.into()),
            items,
        }
    }

    /// Create a checkpoint without a label.
    #[must_use]
    pub fn unlabeled(items: Vec<T>) -> Self {
        Self { label: None, items }
    }

    /// Whether this checkpoint carries `label`.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.label.as_deref() == Some(label)
    }
}

/// First checkpoint in `checkpoints` carrying `label`.
pub(crate) fn find<'a, T>(
    checkpoints: &'a [Checkpoint<T>],
    label: &str,
) -> Option<&'a Checkpoint<T>> {
    checkpoints.iter().find(|c| c.has_label(label))
}

/// Remove the first checkpoint carrying `label`.
pub(crate) fn remove_first<T>(
    checkpoints: &mut Vec<Checkpoint<T>>,
    label: &str,
) -> Option<Checkpoint<T>> {
    let pos = checkpoints.iter().position(|c| c.has_label(label))?;
    Some(checkpoints.remove(pos))
}
