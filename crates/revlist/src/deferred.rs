#![forbid(unsafe_code)]

//! Recorded operation chains replayed on demand.
//!
//! A [`DeferredCommandQueue`] collects [`Command`]s against a list without
//! touching it. [`evaluate`](DeferredCommandQueue::evaluate) replays them in
//! order through the regular [`VersionedList`] methods, so every mutation
//! records history and notifies listeners exactly as a direct call would,
//! and returns the outcome of the final command.
//!
//! ```text
//! list.lazy().push(4).reverse().slice(None, Some(2)).evaluate()
//!   ├─ push(4)        -> records, broadcasts "add"
//!   ├─ reverse()      -> records, broadcasts "reverse"
//!   └─ slice(..2)     -> returned as Outcome::Items
//! ```
//!
//! # Named Commands
//!
//! Commands can also be named at runtime with [`Command::from_name`] (element
//! arguments only) or [`Command::named`] (typed [`Arg`]s). Every name that
//! [`Command::name`] reports is accepted. Arguments of each kind are read in
//! order:
//!
//! | name | elements | indices | other |
//! |------|----------|---------|-------|
//! | `push`, `pushAll`, `unshift` | any | none | |
//! | `pop`, `shift`, `reverse`, `length` | none | none | |
//! | `splice` | inserted | `start[, deleteCount]` | |
//! | `sort` | none | none | optional [`Arg::Compare`] |
//! | `fill` | one value | `[start[, end]]` | |
//! | `copyWithin` | none | `target, start[, end]` | |
//! | `undo`, `redo` | none | `[times]` | |
//! | `slice` | none | `[start[, end]]` | |
//! | `indexOf`, `includes` | one needle | none | |
//! | `filter` | none | none | one [`Arg::Test`] |
//!
//! Names are resolved at evaluation, so an unknown name or a wrong argument
//! list fails only when the chain runs, after earlier commands have already
//! been applied.
//!
//! A natural-order `sort` needs `T: Ord`, which the queue cannot discover
//! on its own. [`sort`](DeferredCommandQueue::sort) and
//! [`ordered`](DeferredCommandQueue::ordered) capture it; without either, an
//! argument-less `sort` fails with [`HistoryError::InvalidArguments`].

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{HistoryError, Result};
use crate::list::VersionedList;

/// Comparator used by [`Command::SortBy`].
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// Predicate used by [`Command::Filter`].
pub type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

/// Every method name a chain accepts.
const METHODS: &[&str] = &[
    "push",
    "pushAll",
    "pop",
    "shift",
    "unshift",
    "splice",
    "reverse",
    "sort",
    "fill",
    "copyWithin",
    "undo",
    "redo",
    "length",
    "slice",
    "indexOf",
    "includes",
    "filter",
];

/// One recorded operation.
#[derive(Clone)]
pub enum Command<T> {
    Push(T),
    PushAll(Vec<T>),
    Pop,
    Shift,
    Unshift(Vec<T>),
    Splice {
        start: isize,
        delete_count: Option<usize>,
        items: Vec<T>,
    },
    Reverse,
    /// Natural-order sort; see [`DeferredCommandQueue::ordered`].
    Sort,
    SortBy(Comparator<T>),
    Fill {
        value: T,
        start: Option<isize>,
        end: Option<isize>,
    },
    CopyWithin {
        target: isize,
        start: isize,
        end: Option<isize>,
    },
    Undo(usize),
    Redo(usize),
    Len,
    Slice {
        start: Option<isize>,
        end: Option<isize>,
    },
    IndexOf(T),
    Includes(T),
    Filter(Predicate<T>),
    /// A method named at runtime; resolved when the queue is evaluated.
    Named { name: String, args: Vec<Arg<T>> },
}

/// Positional argument of a [`Command::Named`].
#[derive(Clone)]
pub enum Arg<T> {
    /// An element: appended, inserted, used as a fill value or a needle.
    Item(T),
    /// A relative index or a count.
    Index(isize),
    Compare(Comparator<T>),
    Test(Predicate<T>),
}

impl<T: fmt::Debug> fmt::Debug for Arg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(v) => f.debug_tuple("Item").field(v).finish(),
            Self::Index(i) => f.debug_tuple("Index").field(i).finish(),
            Self::Compare(_) => f.write_str("Compare(..)"),
            Self::Test(_) => f.write_str("Test(..)"),
        }
    }
}

/// Arguments of a named command, split by kind.
struct NamedArgs<T> {
    items: Vec<T>,
    indices: Vec<isize>,
    compare: Vec<Comparator<T>>,
    tests: Vec<Predicate<T>>,
}

impl<T> NamedArgs<T> {
    fn split(args: Vec<Arg<T>>) -> Self {
        let mut out = Self {
            items: Vec::new(),
            indices: Vec::new(),
            compare: Vec::new(),
            tests: Vec::new(),
        };
        for arg in args {
            match arg {
                Arg::Item(v) => out.items.push(v),
                Arg::Index(i) => out.indices.push(i),
                Arg::Compare(c) => out.compare.push(c),
                Arg::Test(p) => out.tests.push(p),
            }
        }
        out
    }
}

impl<T> Command<T> {
    /// Record a method by name with element arguments. Resolution is
    /// deferred to evaluation.
    #[must_use]
    pub fn from_name(name: impl Into<String>, args: Vec<T>) -> Self {
        Self::named(name, args.into_iter().map(Arg::Item).collect())
    }

    /// Record a method by name with typed arguments.
    #[must_use]
    pub fn named(name: impl Into<String>, args: Vec<Arg<T>>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    /// Method name, for logging and by-name dispatch.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Push(_) => "push",
            Self::PushAll(_) => "pushAll",
            Self::Pop => "pop",
            Self::Shift => "shift",
            Self::Unshift(_) => "unshift",
            Self::Splice { .. } => "splice",
            Self::Reverse => "reverse",
            Self::Sort | Self::SortBy(_) => "sort",
            Self::Fill { .. } => "fill",
            Self::CopyWithin { .. } => "copyWithin",
            Self::Undo(_) => "undo",
            Self::Redo(_) => "redo",
            Self::Len => "length",
            Self::Slice { .. } => "slice",
            Self::IndexOf(_) => "indexOf",
            Self::Includes(_) => "includes",
            Self::Filter(_) => "filter",
            Self::Named { name, .. } => name.as_str(),
        }
    }

    /// The same command in its by-name form.
    ///
    /// Resolving the result yields a command with the same effect.
    #[must_use]
    pub fn into_named(self) -> Self {
        let name = self.name().to_string();
        let args = match self {
            Self::Push(v) | Self::IndexOf(v) | Self::Includes(v) => vec![Arg::Item(v)],
            Self::PushAll(items) | Self::Unshift(items) => {
                items.into_iter().map(Arg::Item).collect()
            }
            Self::Pop | Self::Shift | Self::Reverse | Self::Sort | Self::Len => Vec::new(),
            Self::Splice {
                start,
                delete_count,
                items,
            } => {
                let mut args = vec![Arg::Index(start)];
                args.extend(delete_count.map(|n| Arg::Index(signed(n))));
                args.extend(items.into_iter().map(Arg::Item));
                args
            }
            Self::SortBy(compare) => vec![Arg::Compare(compare)],
            Self::Fill { value, start, end } => {
                let mut args = vec![Arg::Item(value)];
                args.extend(range_args(start, end));
                args
            }
            Self::CopyWithin { target, start, end } => {
                let mut args = vec![Arg::Index(target), Arg::Index(start)];
                args.extend(end.map(Arg::Index));
                args
            }
            Self::Undo(times) | Self::Redo(times) => vec![Arg::Index(signed(times))],
            Self::Slice { start, end } => range_args(start, end),
            Self::Filter(predicate) => vec![Arg::Test(predicate)],
            named @ Self::Named { .. } => return named,
        };
        Self::Named { name, args }
    }

    /// Turn a [`Command::Named`] into its concrete command.
    fn resolve(self) -> Result<Self> {
        let (name, args) = match self {
            Self::Named { name, args } => (name, args),
            other => return Ok(other),
        };
        let NamedArgs {
            mut items,
            indices,
            mut compare,
            mut tests,
        } = NamedArgs::split(args);
        let method = name.as_str();
        let shape = (method, items.len(), indices.as_slice(), compare.len(), tests.len());
        let command = match shape {
            ("push", 1, [], 0, 0) => items.pop().map(Self::Push),
            ("push" | "pushAll", _, [], 0, 0) => Some(Self::PushAll(items)),
            ("unshift", _, [], 0, 0) => Some(Self::Unshift(items)),
            ("pop", 0, [], 0, 0) => Some(Self::Pop),
            ("shift", 0, [], 0, 0) => Some(Self::Shift),
            ("reverse", 0, [], 0, 0) => Some(Self::Reverse),
            ("length", 0, [], 0, 0) => Some(Self::Len),
            ("sort", 0, [], 0, 0) => Some(Self::Sort),
            ("sort", 0, [], 1, 0) => compare.pop().map(Self::SortBy),
            ("filter", 0, [], 0, 1) => tests.pop().map(Self::Filter),
            ("splice", _, &[start], 0, 0) => Some(Self::Splice {
                start,
                delete_count: None,
                items,
            }),
            ("splice", _, &[start, count], 0, 0) => Some(Self::Splice {
                start,
                delete_count: Some(unsigned(method, count)?),
                items,
            }),
            ("fill", 1, [], 0, 0) => items.pop().map(|value| Self::Fill {
                value,
                start: None,
                end: None,
            }),
            ("fill", 1, &[start], 0, 0) => items.pop().map(|value| Self::Fill {
                value,
                start: Some(start),
                end: None,
            }),
            ("fill", 1, &[start, end], 0, 0) => items.pop().map(|value| Self::Fill {
                value,
                start: Some(start),
                end: Some(end),
            }),
            ("copyWithin", 0, &[target, start], 0, 0) => Some(Self::CopyWithin {
                target,
                start,
                end: None,
            }),
            ("copyWithin", 0, &[target, start, end], 0, 0) => Some(Self::CopyWithin {
                target,
                start,
                end: Some(end),
            }),
            ("undo", 0, [], 0, 0) => Some(Self::Undo(1)),
            ("undo", 0, &[times], 0, 0) => Some(Self::Undo(unsigned(method, times)?)),
            ("redo", 0, [], 0, 0) => Some(Self::Redo(1)),
            ("redo", 0, &[times], 0, 0) => Some(Self::Redo(unsigned(method, times)?)),
            ("slice", 0, [], 0, 0) => Some(Self::Slice {
                start: None,
                end: None,
            }),
            ("slice", 0, &[start], 0, 0) => Some(Self::Slice {
                start: Some(start),
                end: None,
            }),
            ("slice", 0, &[start, end], 0, 0) => Some(Self::Slice {
                start: Some(start),
                end: Some(end),
            }),
            ("indexOf", 1, [], 0, 0) => items.pop().map(Self::IndexOf),
            ("includes", 1, [], 0, 0) => items.pop().map(Self::Includes),
            (known, ..) if METHODS.contains(&known) => {
                return Err(invalid(known, "unsupported argument list"));
            }
            (unknown, ..) => return Err(HistoryError::UnknownCommand(unknown.to_string())),
        };
        command.ok_or_else(|| invalid(method, "missing argument"))
    }
}

/// Trailing `[start[, end]]` indices; an end alone needs an explicit start.
fn range_args<T>(start: Option<isize>, end: Option<isize>) -> Vec<Arg<T>> {
    match (start, end) {
        (None, None) => Vec::new(),
        (Some(start), None) => vec![Arg::Index(start)],
        (start, Some(end)) => vec![Arg::Index(start.unwrap_or(0)), Arg::Index(end)],
    }
}

fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

fn unsigned(method: &str, n: isize) -> Result<usize> {
    usize::try_from(n).map_err(|_| invalid(method, "counts must not be negative"))
}

fn invalid(method: &str, reason: &str) -> HistoryError {
    HistoryError::InvalidArguments {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

impl<T: fmt::Debug> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(v) => f.debug_tuple("Push").field(v).finish(),
            Self::PushAll(v) => f.debug_tuple("PushAll").field(v).finish(),
            Self::Unshift(v) => f.debug_tuple("Unshift").field(v).finish(),
            Self::IndexOf(v) => f.debug_tuple("IndexOf").field(v).finish(),
            Self::Includes(v) => f.debug_tuple("Includes").field(v).finish(),
            Self::Named { name, args } => f
                .debug_struct("Named")
                .field("name", name)
                .field("args", args)
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Result of the last command in an evaluated chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// New length (`push`, `unshift`) or current length.
    Len(usize),
    /// A removed element (`pop`, `shift`).
    Item(Option<T>),
    /// A sequence (`splice` removals, `reverse`, `sort`, `slice`, ...).
    Items(Vec<T>),
    Index(Option<usize>),
    Bool(bool),
}

/// Ordered list of commands bound to one list.
pub struct DeferredCommandQueue<T> {
    list: VersionedList<T>,
    commands: Vec<Command<T>>,
    natural_order: Option<Comparator<T>>,
}

impl<T: fmt::Debug> fmt::Debug for DeferredCommandQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredCommandQueue")
            .field("commands", &self.commands)
            .field("ordered", &self.natural_order.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + PartialEq + 'static> DeferredCommandQueue<T> {
    pub(crate) fn new(list: VersionedList<T>) -> Self {
        Self {
            list,
            commands: Vec::new(),
            natural_order: None,
        }
    }

    /// Append a command.
    pub fn record(&mut self, command: Command<T>) {
        self.commands.push(command);
    }

    /// Append a command, builder style.
    #[must_use]
    pub fn then(mut self, command: Command<T>) -> Self {
        self.record(command);
        self
    }

    /// Append a method by name with element arguments; see
    /// [`Command::from_name`].
    #[must_use]
    pub fn call(self, name: impl Into<String>, args: Vec<T>) -> Self {
        self.then(Command::from_name(name, args))
    }

    /// Append a method by name with typed arguments; see [`Command::named`].
    #[must_use]
    pub fn call_with(self, name: impl Into<String>, args: Vec<Arg<T>>) -> Self {
        self.then(Command::named(name, args))
    }

    /// Recorded commands, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[Command<T>] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    // ====================================================================
    // Fluent recorders
    // ====================================================================

    #[must_use]
    pub fn push(self, item: T) -> Self {
        self.then(Command::Push(item))
    }

    #[must_use]
    pub fn push_all(self, items: Vec<T>) -> Self {
        self.then(Command::PushAll(items))
    }

    #[must_use]
    pub fn pop(self) -> Self {
        self.then(Command::Pop)
    }

    #[must_use]
    pub fn shift(self) -> Self {
        self.then(Command::Shift)
    }

    #[must_use]
    pub fn unshift(self, items: Vec<T>) -> Self {
        self.then(Command::Unshift(items))
    }

    #[must_use]
    pub fn splice(self, start: isize, delete_count: Option<usize>, items: Vec<T>) -> Self {
        self.then(Command::Splice {
            start,
            delete_count,
            items,
        })
    }

    #[must_use]
    pub fn reverse(self) -> Self {
        self.then(Command::Reverse)
    }

    #[must_use]
    pub fn sort_by(self, compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        self.then(Command::SortBy(Rc::new(compare)))
    }

    #[must_use]
    pub fn fill(self, value: T, start: Option<isize>, end: Option<isize>) -> Self {
        self.then(Command::Fill { value, start, end })
    }

    #[must_use]
    pub fn copy_within(self, target: isize, start: isize, end: Option<isize>) -> Self {
        self.then(Command::CopyWithin { target, start, end })
    }

    #[must_use]
    pub fn undo(self, times: usize) -> Self {
        self.then(Command::Undo(times))
    }

    #[must_use]
    pub fn redo(self, times: usize) -> Self {
        self.then(Command::Redo(times))
    }

    #[must_use]
    pub fn length(self) -> Self {
        self.then(Command::Len)
    }

    #[must_use]
    pub fn slice(self, start: Option<isize>, end: Option<isize>) -> Self {
        self.then(Command::Slice { start, end })
    }

    #[must_use]
    pub fn index_of(self, needle: T) -> Self {
        self.then(Command::IndexOf(needle))
    }

    #[must_use]
    pub fn includes(self, needle: T) -> Self {
        self.then(Command::Includes(needle))
    }

    #[must_use]
    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        self.then(Command::Filter(Rc::new(predicate)))
    }

    // ====================================================================
    // Evaluation
    // ====================================================================

    /// Replay every command in order and return the last outcome.
    ///
    /// Returns `Ok(None)` for an empty queue. The queue is cleared in every
    /// case. On error, commands before the failing one have already been
    /// applied and the rest are dropped.
    pub fn evaluate(&mut self) -> Result<Option<Outcome<T>>> {
        let commands = std::mem::take(&mut self.commands);
        let total = commands.len();
        let mut last = None;
        for (step, command) in commands.into_iter().enumerate() {
            let command = command.resolve()?;
            debug!(
                target: "revlist.deferred",
                step,
                total,
                command = command.name(),
                "evaluate"
            );
            last = Some(self.apply(command)?);
        }
        Ok(last)
    }

    fn apply(&self, command: Command<T>) -> Result<Outcome<T>> {
        let list = &self.list;
        let outcome = match command {
            Command::Push(item) => Outcome::Len(list.push(item)),
            Command::PushAll(items) => Outcome::Len(list.push_all(items)),
            Command::Pop => Outcome::Item(list.pop()),
            Command::Shift => Outcome::Item(list.shift()),
            Command::Unshift(items) => Outcome::Len(list.unshift(items)),
            Command::Splice {
                start,
                delete_count,
                items,
            } => Outcome::Items(list.splice(start, delete_count, items)),
            Command::Reverse => Outcome::Items(list.reverse()),
            Command::Sort => {
                let Some(compare) = &self.natural_order else {
                    return Err(invalid(
                        "sort",
                        "no natural order recorded; use `ordered()` or pass a comparator",
                    ));
                };
                Outcome::Items(list.sort_by(|a, b| compare(a, b)))
            }
            Command::SortBy(compare) => Outcome::Items(list.sort_by(|a, b| compare(a, b))),
            Command::Fill { value, start, end } => Outcome::Items(list.fill(value, start, end)),
            Command::CopyWithin { target, start, end } => {
                Outcome::Items(list.copy_within(target, start, end))
            }
            Command::Undo(times) => Outcome::Items(list.undo(times)),
            Command::Redo(times) => Outcome::Items(list.redo(times)),
            Command::Len => Outcome::Len(list.len()),
            Command::Slice { start, end } => Outcome::Items(list.slice(start, end)),
            Command::IndexOf(needle) => Outcome::Index(list.index_of(&needle)),
            Command::Includes(needle) => Outcome::Bool(list.includes(&needle)),
            Command::Filter(predicate) => Outcome::Items(list.filter(|x| predicate(x))),
            Command::Named { name, .. } => return Err(HistoryError::UnknownCommand(name)),
        };
        Ok(outcome)
    }
}

impl<T: Clone + PartialEq + Ord + 'static> DeferredCommandQueue<T> {
    /// Capture the natural order of `T` so that [`Command::Sort`], including
    /// a by-name `sort` with no comparator, can run.
    #[must_use]
    pub fn ordered(mut self) -> Self {
        let natural: Comparator<T> = Rc::new(|a: &T, b: &T| a.cmp(b));
        self.natural_order = Some(natural);
        self
    }

    /// Record a natural-order sort.
    #[must_use]
    pub fn sort(self) -> Self {
        self.ordered().then(Command::Sort)
    }
}
