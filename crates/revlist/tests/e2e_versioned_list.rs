#![forbid(unsafe_code)]

//! End-to-end scenarios for [`VersionedList`].
//!
//! Validates:
//! - Append, validation and history recording on a concrete session
//! - Checkpoint visibility while navigating
//! - Listener ordering, re-entrant listeners and unsubscription
//! - Export/import between two lists
//! - Deferred chains
//! - Structured logging of rejected input and fan-out

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use revlist::{
    Arg, ChangeEvent, Checkpoint, HistoryError, ListConfig, Outcome, ParseError, VersionedList,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

type EventLog = Rc<RefCell<Vec<(ChangeEvent, Vec<i32>)>>>;

fn record_events(list: &VersionedList<i32>) -> (EventLog, revlist::Subscription) {
    let log: EventLog = Rc::default();
    let sink = Rc::clone(&log);
    let sub = list.subscribe(move |event, items| sink.borrow_mut().push((event, items.to_vec())));
    (log, sub)
}

// ============================================================================
// Tracing capture
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct CaptureLayer(CaptureHandle);

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.0.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.0.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_tracing(f: impl FnOnce()) -> CaptureHandle {
    let handle = CaptureHandle::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer(handle.clone()));
    tracing::subscriber::with_default(subscriber, f);
    handle
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn push_and_rejected_push_session() {
    let list = VersionedList::new(vec![1, 2, 3]);
    list.push(4);
    assert_eq!(list.get(), vec![1, 2, 3, 4]);
    assert_eq!(list.history_len(), 2);
    assert_eq!(list.cursor(), 1);

    list.set_validation(|x| *x > 2);
    assert_eq!(list.push(1), 4);
    assert_eq!(list.get(), vec![1, 2, 3, 4]);
    assert_eq!(list.history_len(), 3);
    assert_eq!(list.cursor(), 2);
}

#[test]
fn checkpoint_visible_only_at_its_entry() {
    let list = VersionedList::new(vec![1, 2, 3]);
    list.push(4);
    list.save_checkpoint("a");
    list.push(5);
    assert!(list.list_checkpoints().is_empty());

    list.go_to(0).unwrap();
    assert!(list.list_checkpoints().is_empty());

    list.go_to(1).unwrap();
    assert_eq!(
        list.list_checkpoints(),
        vec![Checkpoint::labeled("a", vec![1, 2, 3, 4])]
    );
}

#[test]
fn checkpoints_lost_with_their_entry() {
    let list = VersionedList::new(vec![0]);
    list.push(1);
    list.save_checkpoint("old");
    list.push(2);
    list.push(3);
    list.limit(1);
    list.go_to(0).unwrap();
    assert!(list.list_checkpoints().is_empty());

    list.save_checkpoint("kept");
    list.clean();
    assert!(list.list_checkpoints().is_empty());
}

#[test]
fn validation_idempotent_on_repeated_batch() {
    let list = VersionedList::new(Vec::<i32>::new());
    let seen = RefCell::new(HashSet::new());
    list.set_validation(move |x| seen.borrow_mut().insert(*x));
    assert_eq!(list.push_all([1, 2, 3]), 3);
    assert_eq!(list.push_all([1, 2, 3]), 3);
    assert_eq!(list.get(), vec![1, 2, 3]);
}

#[test]
fn undo_then_mutation_discards_future() {
    let list = VersionedList::new(vec![1]);
    for i in 2..=5 {
        list.push(i);
    }
    list.undo(2);
    list.reverse();
    let live = list.get();
    assert_eq!(list.redo(1), live);
    assert!(!list.can_redo());
    assert_eq!(list.history_len(), 4);
}

#[test]
fn navigation_out_of_range_reports_error() {
    let list = VersionedList::new(vec![1]);
    list.push(2);
    let err = list.go_to(7).unwrap_err();
    assert_eq!(err.to_string(), "history index 7 out of range (entries: 2)");
    assert!(matches!(list.jump(-2), Err(HistoryError::OutOfRange { .. })));
    assert_eq!(list.cursor(), 1);
}

// ============================================================================
// Listeners
// ============================================================================

#[test]
fn listeners_receive_events_in_order() {
    let list = VersionedList::new(vec![1, 2]);
    let (log, _sub) = record_events(&list);

    list.push(3);
    list.undo(1);
    list.redo(1);
    list.save_checkpoint("x");
    list.restore_checkpoint("x");
    list.clean();

    let events: Vec<ChangeEvent> = log.borrow().iter().map(|(e, _)| *e).collect();
    assert_eq!(
        events,
        vec![
            ChangeEvent::Initialize,
            ChangeEvent::Add,
            ChangeEvent::Undo,
            ChangeEvent::Redo,
            ChangeEvent::SaveCheckpoint,
            ChangeEvent::RestoreCheckpoint,
            ChangeEvent::Clean,
        ]
    );
    assert_eq!(log.borrow()[2].1, vec![1, 2]);
}

#[test]
fn reentrant_listener_mutates_list() {
    let list = VersionedList::new(vec![1]);
    let handle = list.clone();
    let _echo = list.subscribe(move |event, items| {
        if event == ChangeEvent::Add && items.len() < 4 {
            handle.push(0);
        }
    });
    let (log, _sub) = record_events(&list);

    list.push(9);
    assert_eq!(list.get(), vec![1, 9, 0, 0]);
    assert_eq!(list.history_len(), 4);

    // The nested broadcasts reach the later listener first.
    let seen: Vec<Vec<i32>> = log.borrow().iter().skip(1).map(|(_, s)| s.clone()).collect();
    assert_eq!(seen, vec![vec![1, 9, 0, 0], vec![1, 9, 0], vec![1, 9]]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let list = VersionedList::new(vec![1]);
    let (log, sub) = record_events(&list);
    list.push(2);
    sub.unsubscribe();
    list.push(3);
    assert_eq!(log.borrow().len(), 2);
    list.push(4);
    assert_eq!(list.listener_count(), 0);
}

#[test]
fn listener_panic_leaves_history_recorded() {
    let list = VersionedList::new(vec![1]);
    let _sub = list.subscribe(|event, _| {
        if event == ChangeEvent::Remove {
            panic!("listener refused");
        }
    });
    let clone = list.clone();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        clone.pop();
    }));
    assert!(result.is_err());
    assert_eq!(list.get(), Vec::<i32>::new());
    assert_eq!(list.history_len(), 2);
}

// ============================================================================
// Export / import
// ============================================================================

#[test]
fn history_round_trip_between_lists() {
    let source = VersionedList::new(vec![1, 2, 3]);
    source.push(4);
    source.save_checkpoint("a");
    source.push(5);
    source.save_unlabeled_checkpoint();

    let json = source.to_json().unwrap();
    let target = VersionedList::new(Vec::new());
    let (log, _sub) = record_events(&target);
    target.import(&json).unwrap();

    assert_eq!(target.entries(), source.entries());
    assert_eq!(target.cursor(), source.cursor());
    assert_eq!(target.get(), vec![1, 2, 3, 4, 5]);
    assert_eq!(log.borrow().last().unwrap().0, ChangeEvent::Import);
}

#[test]
fn import_rejects_bad_documents() {
    let list = VersionedList::new(vec![1]);
    for bad in ["", "{}", "[]", "[[1]]", r#"[{"items":["x"],"checkpoints":[]}]"#] {
        let err = list.import(bad).unwrap_err();
        assert!(matches!(err, HistoryError::Parse(_)), "{bad}: {err}");
    }
    assert!(matches!(
        list.import("[]"),
        Err(HistoryError::Parse(ParseError::EmptyHistory))
    ));
    assert_eq!(list.history_len(), 1);
}

#[test]
fn csv_export_with_nested_elements() {
    let list = VersionedList::new(vec![vec![1, 2], vec![3]]);
    list.push(vec![4]);
    list.save_checkpoint("cp");
    assert_eq!(list.to_csv().unwrap(), "1,2,3\n1,2,3,4,cp,1,2,3,4");

    let shallow = VersionedList::with_config(
        vec![vec![1, 2]],
        None,
        ListConfig::default().with_flatten_depth(0),
    )
    .unwrap();
    assert_eq!(shallow.to_csv_with("|").unwrap(), "[1,2]");
}

#[test]
fn auto_limit_from_config() {
    let config = ListConfig::from_json_str(r#"{"max_entries": 2}"#).unwrap();
    let list = VersionedList::with_config(vec![0], None, config).unwrap();
    list.push(1);
    list.push(2);
    assert_eq!(list.history_len(), 2);
    assert_eq!(list.undo(5), vec![0, 1]);
}

// ============================================================================
// Deferred chains
// ============================================================================

#[test]
fn deferred_chain_matches_direct_calls() {
    let direct = VersionedList::new(vec![3, 1, 2]);
    direct.push(0);
    direct.sort();
    let expected = direct.slice(Some(1), None);

    let lazy = VersionedList::new(vec![3, 1, 2]);
    let out = lazy
        .lazy()
        .push(0)
        .sort_by(Ord::cmp)
        .slice(Some(1), None)
        .evaluate()
        .unwrap();
    assert_eq!(out, Some(Outcome::Items(expected)));
    assert_eq!(lazy.entries(), direct.entries());
}

#[test]
fn deferred_reported_names_dispatch_by_name() {
    let list = VersionedList::new(vec![4, 2, 3, 1]);
    let out = list
        .lazy()
        .ordered()
        .call("sort", vec![])
        .call_with("splice", vec![Arg::Index(0), Arg::Index(1)])
        .call_with("copyWithin", vec![Arg::Index(0), Arg::Index(-1)])
        .call("length", vec![])
        .evaluate()
        .unwrap();
    assert_eq!(out, Some(Outcome::Len(3)));
    assert_eq!(list.get(), vec![4, 3, 4]);
    assert_eq!(list.history_len(), 4);

    let sample = list.lazy().sort().reverse().push(0);
    for command in sample.commands() {
        let name = command.name().to_string();
        let err = list.lazy().call(name.clone(), vec![9, 9, 9, 9]).evaluate();
        assert!(
            !matches!(err, Err(HistoryError::UnknownCommand(_))),
            "{name} should be a known method"
        );
    }
}

#[test]
fn deferred_unknown_method_fails_late() {
    let list = VersionedList::new(vec![1]);
    let mut queue = list.lazy().call("push", vec![2]).call("explode", vec![]);
    assert_eq!(list.get(), vec![1]);
    assert!(matches!(
        queue.evaluate(),
        Err(HistoryError::UnknownCommand(name)) if name == "explode"
    ));
    assert_eq!(list.get(), vec![1, 2]);
}

// ============================================================================
// Logging
// ============================================================================

#[test]
fn failed_deserialize_is_logged() {
    let list = VersionedList::new(vec![1, 2]);
    let handle = with_captured_tracing(|| {
        assert!(!list.deserialize("not json"));
    });
    assert_eq!(list.get(), vec![1, 2]);
    assert_eq!(list.history_len(), 1);

    let warnings: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].target, "revlist.serialize");
    assert!(warnings[0].fields.contains_key("error"));
}

#[test]
fn broadcast_runs_inside_span() {
    let list = VersionedList::new(vec![1]);
    let _sub = list.subscribe(|_, _| {});
    let handle = with_captured_tracing(|| {
        list.push(2);
    });

    let spans = handle.spans();
    let broadcast: Vec<_> = spans.iter().filter(|s| s.name == "revlist.broadcast").collect();
    assert_eq!(broadcast.len(), 1);
    assert_eq!(broadcast[0].fields.get("event").map(String::as_str), Some("add"));
    assert_eq!(broadcast[0].fields.get("listeners").map(String::as_str), Some("1"));

    let history: Vec<_> = handle
        .events()
        .into_iter()
        .filter(|e| e.target == "revlist.history")
        .collect();
    assert!(!history.is_empty());
}
