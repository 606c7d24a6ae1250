#![forbid(unsafe_code)]

//! Versioned list: an ordered collection that records every mutation as a
//! full snapshot, supports linear undo/redo, per-entry checkpoints,
//! synchronous change notification, deferred operation chains and JSON/CSV
//! export.
//!
//! # Example
//!
//! ```
//! use revlist::{ChangeEvent, VersionedList};
//!
//! let list = VersionedList::new(vec![1, 2, 3]);
//! let _sub = list.subscribe(|event, items| {
//!     if event == ChangeEvent::Add {
//!         assert_eq!(items.last(), Some(&4));
//!     }
//! });
//!
//! list.push(4);
//! assert_eq!(list.history_len(), 2);
//!
//! list.undo(1);
//! assert_eq!(list.get(), vec![1, 2, 3]);
//!
//! list.redo(1);
//! assert_eq!(list.get(), vec![1, 2, 3, 4]);
//! ```
//!
//! # Modules
//!
//! - [`sequence`]: live elements and the admission predicate
//! - [`history`]: entries, cursor and navigation
//! - [`checkpoint`]: labelled snapshots attached to one entry
//! - [`notify`]: listener registry and fan-out
//! - [`deferred`]: recorded command chains
//! - [`serialize`]: JSON and CSV conversion
//! - [`config`]: tunables loaded from JSON or TOML
//!
//! # Logging
//!
//! The crate emits `tracing` events and installs no subscriber. Targets:
//! `revlist.history` (recording, navigation, maintenance), `revlist.notify`
//! (fan-out), `revlist.deferred` (chain evaluation) and `revlist.serialize`
//! (rejected input).

pub mod checkpoint;
pub mod config;
pub mod deferred;
pub mod error;
pub mod event;
pub mod history;
mod list;
pub mod notify;
mod query;
pub mod sequence;
pub mod serialize;

pub use checkpoint::Checkpoint;
pub use config::ListConfig;
pub use deferred::{Arg, Command, DeferredCommandQueue, Outcome};
pub use error::{ConfigError, HistoryError, ParseError, Result};
pub use event::ChangeEvent;
pub use history::{HistoryEntry, HistoryStore};
pub use list::VersionedList;
pub use notify::{NotificationHub, Subscription};
pub use query::slice_of;
pub use sequence::{ValidatedSequence, Validator, resolve_index};
