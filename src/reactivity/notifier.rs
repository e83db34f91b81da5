// ============================================================================
// spark-lists - Change Notifier
// Synchronous fan-out of change records to registered observers
// ============================================================================
//
// Every list type owns one Notifier. Delivery is synchronous: `emit` returns
// only after every observer has run. The observer list is snapshotted per
// record, so an observer added while a record is in flight does not see that
// record, and one removed while a record is in flight still receives it but
// nothing dispatched afterwards.
//
// No RefCell borrow is held while observers run, which is what makes nested
// mutation from inside an observer safe.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::event::{EventKind, ListEvent};

/// An observer callback.
pub type Observer<T> = Rc<dyn Fn(&ListEvent<T>)>;

// =============================================================================
// REGISTRY
// =============================================================================

struct Entry<T> {
    id: u64,
    /// `None` receives every record.
    kind: Option<EventKind>,
    observer: Observer<T>,
}

struct Registry<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<Entry<T>>>,
}

impl<T> Registry<T> {
    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|entry| entry.id != id);
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Registry of observers plus the dispatch loop.
pub struct Notifier<T> {
    registry: Rc<Registry<T>>,
    label: Rc<str>,
}

impl<T: 'static> Notifier<T> {
    /// Create a notifier whose tracing events carry `label`.
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            registry: Rc::new(Registry {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
            label: Rc::from(label.as_ref()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register an observer for every record.
    pub fn subscribe(&self, observer: impl Fn(&ListEvent<T>) + 'static) -> Subscription {
        self.register(None, Rc::new(observer))
    }

    /// Register an already shared observer.
    pub fn register(&self, kind: Option<EventKind>, observer: Observer<T>) -> Subscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        self.registry.entries.borrow_mut().push(Entry { id, kind, observer });

        let on_drop: Weak<Registry<T>> = Rc::downgrade(&self.registry);
        let on_query = on_drop.clone();
        Subscription::new(
            move || {
                if let Some(registry) = on_drop.upgrade() {
                    registry.remove(id);
                }
            },
            move || on_query.upgrade().is_some_and(|registry| registry.contains(id)),
        )
    }

    /// Deliver one record to every current observer.
    pub fn emit(&self, event: &ListEvent<T>) {
        let kind = event.kind();
        let observers: Vec<Observer<T>> = self
            .registry
            .entries
            .borrow()
            .iter()
            .filter(|entry| entry.kind.is_none_or(|k| k == kind))
            .map(|entry| entry.observer.clone())
            .collect();

        if observers.is_empty() {
            return;
        }

        trace!(
            list = %self.label,
            kind = kind.name(),
            observers = observers.len(),
            "dispatching list event"
        );

        for observer in observers {
            observer(event);
        }
    }

    /// Deliver records in order.
    pub fn emit_all(&self, events: impl IntoIterator<Item = ListEvent<T>>) {
        for event in events {
            self.emit(&event);
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.registry.entries.borrow().len()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Keeps an observer registered. Dropping it unregisters the observer.
#[must_use = "dropping a Subscription unregisters its observer immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
    is_registered: Box<dyn Fn() -> bool>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + 'static, is_registered: impl Fn() -> bool + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
            is_registered: Box::new(is_registered),
        }
    }

    /// Whether the observer is still registered with a live notifier.
    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some() && (self.is_registered)()
    }

    /// Unregister now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
