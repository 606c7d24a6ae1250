#![forbid(unsafe_code)]

//! Event tags broadcast to listeners.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened to the list.
///
/// The string form ([`as_str`](Self::as_str)) is stable and matches the serde
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeEvent {
    /// Synthetic event delivered once to a new listener.
    Initialize,
    /// Single-element append.
    Add,
    /// Batch append.
    BatchAdd,
    /// Last element removed.
    Remove,
    /// First element removed.
    Shift,
    /// Elements prepended.
    Unshift,
    Splice,
    Reverse,
    Sort,
    Fill,
    CopyWithin,
    /// Live sequence replaced from structured text.
    Deserialize,
    Previous,
    Next,
    Jump,
    GoTo,
    Undo,
    Redo,
    Clean,
    Limit,
    SaveCheckpoint,
    RestoreCheckpoint,
    RemoveCheckpoint,
    Import,
}

impl ChangeEvent {
    /// Stable event tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Add => "add",
            Self::BatchAdd => "batchAdd",
            Self::Remove => "remove",
            Self::Shift => "shift",
            Self::Unshift => "unshift",
            Self::Splice => "splice",
            Self::Reverse => "reverse",
            Self::Sort => "sort",
            Self::Fill => "fill",
            Self::CopyWithin => "copyWithin",
            Self::Deserialize => "deserialize",
            Self::Previous => "previous",
            Self::Next => "next",
            Self::Jump => "jump",
            Self::GoTo => "goTo",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Clean => "clean",
            Self::Limit => "limit",
            Self::SaveCheckpoint => "saveCheckpoint",
            Self::RestoreCheckpoint => "restoreCheckpoint",
            Self::RemoveCheckpoint => "removeCheckpoint",
            Self::Import => "import",
        }
    }

    /// Whether the event records a new history entry.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::Add
                | Self::BatchAdd
                | Self::Remove
                | Self::Shift
                | Self::Unshift
                | Self::Splice
                | Self::Reverse
                | Self::Sort
                | Self::Fill
                | Self::CopyWithin
                | Self::Deserialize
        )
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
