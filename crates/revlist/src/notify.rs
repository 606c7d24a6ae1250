#![forbid(unsafe_code)]

//! Listener registry with synchronous, ordered fan-out.
//!
//! # Design
//!
//! [`NotificationHub<T>`] stores listeners as weak references; the strong
//! reference lives in the [`Subscription`] guard handed back to the caller.
//! Dropping the guard (or calling [`Subscription::unsubscribe`]) removes the
//! listener. Dead entries are pruned lazily on the next broadcast.
//!
//! # Failure Modes
//!
//! - **Panicking listener**: the panic propagates out of `broadcast` and the
//!   remaining listeners for that event are skipped. There is no isolation.
//! - **Re-entrant mutation**: a listener may mutate the list it observes.
//!   The registry borrow is released before any callback runs, so this is
//!   safe, but the nested event is delivered to every listener before the
//!   outer fan-out continues. Later listeners therefore see the outer event
//!   after the nested one.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span};

use crate::event::ChangeEvent;

type ListenerRc<T> = Rc<dyn Fn(ChangeEvent, &[T])>;
type ListenerWeak<T> = Weak<dyn Fn(ChangeEvent, &[T])>;

/// Ordered registry of change listeners.
pub struct NotificationHub<T> {
    listeners: RefCell<Vec<ListenerWeak<T>>>,
}

impl<T> fmt::Debug for NotificationHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("listener_count", &self.listeners.borrow().len())
            .finish()
    }
}

impl<T> Default for NotificationHub<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<T: 'static> NotificationHub<T> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` and deliver `ChangeEvent::Initialize` with
    /// `state` to it immediately.
    ///
    /// The listener stays registered for as long as the returned guard is
    /// alive.
    pub fn subscribe(
        &self,
        state: &[T],
        listener: impl Fn(ChangeEvent, &[T]) + 'static,
    ) -> Subscription {
        let strong: ListenerRc<T> = Rc::new(listener);
        self.listeners.borrow_mut().push(Rc::downgrade(&strong));
        strong(ChangeEvent::Initialize, state);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Call every live listener with `event` and `state`, in registration
    /// order.
    pub fn broadcast(&self, event: ChangeEvent, state: &[T]) {
        let callbacks: Vec<ListenerRc<T>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|w| w.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        if callbacks.is_empty() {
            return;
        }

        let _span = debug_span!(
            "revlist.broadcast",
            event = event.as_str(),
            listeners = callbacks.len()
        )
        .entered();

        for cb in &callbacks {
            cb(event, state);
        }
        debug!(target: "revlist.notify", event = event.as_str(), "broadcast complete");
    }

    /// Number of registered listeners, including dropped ones not yet
    /// pruned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// RAII guard for a registered listener.
///
/// Dropping the guard unregisters the listener.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct Subscription {
    /// Type-erased strong reference keeping the listener `Rc` alive.
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Unregister the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Log = Rc<RefCell<Vec<(ChangeEvent, Vec<i32>)>>>;

    fn recorder(log: &Log) -> impl Fn(ChangeEvent, &[i32]) + 'static {
        let log = Rc::clone(log);
        move |event, items| log.borrow_mut().push((event, items.to_vec()))
    }

    #[test]
    fn subscribe_delivers_initialize() {
        let hub = NotificationHub::new();
        let log: Log = Rc::default();
        let _sub = hub.subscribe(&[1, 2], recorder(&log));
        assert_eq!(*log.borrow(), vec![(ChangeEvent::Initialize, vec![1, 2])]);
    }

    #[test]
    fn broadcast_reaches_all_in_order() {
        let hub = NotificationHub::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&order), Rc::clone(&order));
        let _sa = hub.subscribe(&[], move |e, _| {
            if e != ChangeEvent::Initialize {
                a.borrow_mut().push("a");
            }
        });
        let _sb = hub.subscribe(&[], move |e, _| {
            if e != ChangeEvent::Initialize {
                b.borrow_mut().push("b");
            }
        });
        hub.broadcast(ChangeEvent::Add, &[1]);
        assert_eq!(*order.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let hub = NotificationHub::new();
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let sub = hub.subscribe(&[], move |_, _: &[i32]| c.set(c.get() + 1));
        hub.broadcast(ChangeEvent::Add, &[]);
        assert_eq!(count.get(), 2);

        sub.unsubscribe();
        hub.broadcast(ChangeEvent::Add, &[]);
        assert_eq!(count.get(), 2);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn broadcast_without_listeners_is_noop() {
        let hub: NotificationHub<i32> = NotificationHub::new();
        hub.broadcast(ChangeEvent::Clean, &[]);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn listener_may_subscribe_during_broadcast() {
        let hub = Rc::new(NotificationHub::<i32>::new());
        let inner = Rc::new(RefCell::new(None));
        let (h, slot) = (Rc::clone(&hub), Rc::clone(&inner));
        let _outer = hub.subscribe(&[], move |e, _| {
            if e == ChangeEvent::Add && slot.borrow().is_none() {
                *slot.borrow_mut() = Some(h.subscribe(&[], |_, _| {}));
            }
        });
        hub.broadcast(ChangeEvent::Add, &[]);
        assert_eq!(hub.listener_count(), 2);
    }

    #[test]
    #[should_panic(expected = "listener failed")]
    fn listener_panic_propagates() {
        let hub = NotificationHub::new();
        let _sub = hub.subscribe(&[], |e, _: &[i32]| {
            if e == ChangeEvent::Remove {
                panic!("listener failed");
            }
        });
        hub.broadcast(ChangeEvent::Remove, &[]);
    }

    #[test]
    fn debug_formats() {
        let hub: NotificationHub<i32> = NotificationHub::new();
        assert!(format!("{hub:?}").contains("listener_count"));
        let sub = hub.subscribe(&[], |_, _| {});
        assert!(format!("{sub:?}").contains("Subscription"));
    }
}
