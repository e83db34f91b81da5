// ============================================================================
// spark-lists - Projection Core
// Slot storage, upstream bookkeeping and write forwarding shared by every
// derived list
// ============================================================================
//
// A projection owns its own slots (keys borrowed from the upstream plus value
// clones) so it can answer reads and describe removals without consulting the
// upstream. Writes never touch those slots directly: they are translated into
// upstream writes, and the projection's own records arrive through its
// upstream subscription like any other change.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::collections::source::ObservableList;
use crate::core::context::LengthAnnouncer;
use crate::core::error::ListError;
use crate::core::event::{EventKind, ListEvent};
use crate::core::key::Key;
use crate::reactivity::batching::{batch, LengthAnnouncement};
use crate::reactivity::notifier::{Notifier, Observer, Subscription};

// =============================================================================
// SLOTS
// =============================================================================

/// Ordered keys plus key -> value storage.
pub(crate) struct Slots<T> {
    keys: Vec<Key>,
    values: HashMap<Key, T>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: HashMap::new(),
        }
    }
}

impl<T: Clone> Slots<T> {
    pub(crate) fn from_items(items: impl IntoIterator<Item = (Key, T)>) -> Self {
        let mut slots = Self::default();
        for (key, value) in items {
            if slots.values.insert(key.clone(), value).is_none() {
                slots.keys.push(key);
            }
        }
        slots
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn key_at(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.keys.get(index).and_then(|key| self.values.get(key))
    }

    pub(crate) fn get_by_key(&self, key: &Key) -> Option<&T> {
        self.values.get(key)
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.values.contains_key(key)
    }

    pub(crate) fn position(&self, key: &Key) -> Option<usize> {
        if !self.contains(key) {
            return None;
        }
        self.keys.iter().position(|candidate| candidate == key)
    }

    /// Insert at `index` (clamped). Returns the index used.
    pub(crate) fn insert(&mut self, index: usize, key: Key, value: T) -> usize {
        let index = index.min(self.keys.len());
        self.keys.insert(index, key.clone());
        self.values.insert(key, value);
        index
    }

    /// Remove by key. Returns where it was and its value.
    pub(crate) fn remove(&mut self, key: &Key) -> Option<(usize, T)> {
        let index = self.position(key)?;
        self.keys.remove(index);
        let value = self.values.remove(key)?;
        Some((index, value))
    }

    /// Replace the value behind `key`, returning the old one.
    pub(crate) fn replace(&mut self, key: &Key, value: T) -> Option<T> {
        match self.values.get_mut(key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => None,
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<T> {
        self.keys
            .iter()
            .filter_map(|key| self.values.get(key).cloned())
            .collect()
    }
}

// =============================================================================
// UPSTREAM SNAPSHOT
// =============================================================================

/// Current `(key, value)` pairs of `upstream`, in order.
pub(crate) fn upstream_items<T: 'static>(upstream: &dyn ObservableList<T>) -> Vec<(Key, T)> {
    (0..upstream.len())
        .filter_map(|index| Some((upstream.key_at(index)?, upstream.get(index)?)))
        .collect()
}

// =============================================================================
// PROJECTION CORE
// =============================================================================

/// The parts every derived list has in common.
///
/// A core without an upstream is read-only: it is fed directly by its owner
/// (the groups side of a grouped projection) and rejects every write.
pub(crate) struct ProjectionCore<T> {
    upstream: Option<Rc<dyn ObservableList<T>>>,
    slots: RefCell<Slots<T>>,
    notifier: Notifier<T>,
    length: LengthAnnouncement,
    owner: Weak<dyn LengthAnnouncer>,
    subscription: RefCell<Option<Subscription>>,
    disposed: Cell<bool>,
}

impl<T: Clone + 'static> ProjectionCore<T> {
    pub(crate) fn new(
        upstream: Option<Rc<dyn ObservableList<T>>>,
        slots: Slots<T>,
        label: &str,
        owner: Weak<dyn LengthAnnouncer>,
    ) -> Self {
        Self {
            upstream,
            length: LengthAnnouncement::new(slots.len()),
            slots: RefCell::new(slots),
            notifier: Notifier::new(label),
            owner,
            subscription: RefCell::new(None),
            disposed: Cell::new(false),
        }
    }

    pub(crate) fn upstream(&self) -> Option<&Rc<dyn ObservableList<T>>> {
        self.upstream.as_ref()
    }

    pub(crate) fn slots(&self) -> &RefCell<Slots<T>> {
        &self.slots
    }

    pub(crate) fn label(&self) -> &str {
        self.notifier.label()
    }

    /// Hold the upstream subscription for as long as the projection lives.
    pub(crate) fn attach(&self, subscription: Subscription) {
        *self.subscription.borrow_mut() = Some(subscription);
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn emit(&self, event: ListEvent<T>) {
        self.notifier.emit(&event);
    }

    pub(crate) fn emit_all(&self, events: Vec<ListEvent<T>>) {
        self.notifier.emit_all(events);
    }

    pub(crate) fn schedule_length(&self) {
        self.length.schedule(self.owner.clone());
    }

    /// The owning projection's `LengthAnnouncer` body.
    pub(crate) fn announce_length(&self) {
        let current = self.slots.borrow().len();
        if let Some(length) = self.length.take_change(current) {
            self.emit(ListEvent::LengthChanged { length });
        }
    }

    /// Swap in new contents and announce them with a Reset.
    pub(crate) fn replace_all(&self, slots: Slots<T>) {
        *self.slots.borrow_mut() = slots;
        self.emit(ListEvent::Reset);
        self.schedule_length();
    }

    /// Unsubscribe, clear and go inert.
    pub(crate) fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        debug!(list = %self.label(), "disposing projection");
        drop(self.subscription.borrow_mut().take());
        batch(|| self.replace_all(Slots::default()));
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub(crate) fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<T> {
        self.slots.borrow().get(index).cloned()
    }

    pub(crate) fn key_at(&self, index: usize) -> Option<Key> {
        self.slots.borrow().key_at(index).cloned()
    }

    pub(crate) fn get_by_key(&self, key: &Key) -> Option<T> {
        self.slots.borrow().get_by_key(key).cloned()
    }

    pub(crate) fn index_of_key(&self, key: &Key) -> Option<usize> {
        self.slots.borrow().position(key)
    }

    pub(crate) fn observe(&self, kind: Option<EventKind>, observer: Observer<T>) -> Subscription {
        self.notifier.register(kind, observer)
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    // =========================================================================
    // FORWARDED WRITES
    // =========================================================================

    /// The upstream a write should go to, if writes are allowed.
    fn writable(&self, operation: &'static str) -> Option<&Rc<dyn ObservableList<T>>> {
        if self.is_disposed() {
            debug!(list = %self.label(), operation, "ignoring write to disposed projection");
            return None;
        }
        match self.upstream.as_ref().ok_or(ListError::ReadOnly) {
            Ok(upstream) => Some(upstream),
            Err(err) => {
                warn!(list = %self.label(), operation, %err, "ignoring write");
                None
            }
        }
    }

    pub(crate) fn splice(&self, start: usize, delete_count: usize, values: Vec<T>) -> Vec<T> {
        let Some(upstream) = self.writable("splice") else {
            return Vec::new();
        };

        let (doomed, anchor) = {
            let slots = self.slots.borrow();
            let len = slots.len();
            let start = start.min(len);
            let end = start.saturating_add(delete_count).min(len);
            let doomed: Vec<(Key, T)> = slots.keys()[start..end]
                .iter()
                .filter_map(|key| slots.get_by_key(key).map(|value| (key.clone(), value.clone())))
                .collect();
            (doomed, slots.key_at(start).cloned())
        };

        batch(|| {
            if !values.is_empty() {
                let at = anchor
                    .and_then(|key| upstream.index_of_key(&key))
                    .unwrap_or_else(|| upstream.len());
                upstream.splice(at, 0, values);
            }

            doomed
                .into_iter()
                .filter_map(|(key, value)| {
                    let index = upstream.index_of_key(&key)?;
                    upstream.splice(index, 1, Vec::new());
                    Some(value)
                })
                .collect()
        })
    }

    pub(crate) fn set_at(&self, index: usize, value: T) -> Option<T> {
        let upstream = self.writable("set_at")?;
        let len = self.len();
        if index > len {
            return None;
        }
        if index == len {
            batch(|| upstream.splice(upstream.len(), 0, vec![value]));
            return None;
        }
        let key = self.key_at(index)?;
        let upstream_index = upstream.index_of_key(&key)?;
        batch(|| upstream.set_at(upstream_index, value))
    }

    pub(crate) fn move_item(&self, from: usize, to: usize) {
        let Some(upstream) = self.writable("move_item") else {
            return;
        };
        let (from_key, to_key) = {
            let slots = self.slots.borrow();
            let len = slots.len();
            if from >= len {
                return;
            }
            let to = to.min(len - 1);
            if from == to {
                return;
            }
            match (slots.key_at(from), slots.key_at(to)) {
                (Some(from_key), Some(to_key)) => (from_key.clone(), to_key.clone()),
                _ => return,
            }
        };
        if let (Some(from), Some(to)) = (upstream.index_of_key(&from_key), upstream.index_of_key(&to_key)) {
            batch(|| upstream.move_item(from, to));
        }
    }

    pub(crate) fn notify_mutated_key(&self, key: &Key) {
        if let Some(upstream) = self.writable("notify_mutated") {
            batch(|| upstream.notify_mutated_key(key));
        }
    }
}

// =============================================================================
// OBSERVABLE LIST DELEGATION
// =============================================================================

/// Implement `ObservableList<T>` for a projection handle whose `inner.core`
/// is a `ProjectionCore<T>`.
macro_rules! delegate_to_core {
    ($name:ident < $($param:ident),+ >) => {
        impl<$($param: Clone + 'static),+> $crate::collections::source::ObservableList<T>
            for $name<$($param),+>
        {
            fn len(&self) -> usize {
                self.inner.core.len()
            }

            fn get(&self, index: usize) -> Option<T> {
                self.inner.core.get(index)
            }

            fn key_at(&self, index: usize) -> Option<$crate::core::key::Key> {
                self.inner.core.key_at(index)
            }

            fn get_by_key(&self, key: &$crate::core::key::Key) -> Option<T> {
                self.inner.core.get_by_key(key)
            }

            fn index_of_key(&self, key: &$crate::core::key::Key) -> Option<usize> {
                self.inner.core.index_of_key(key)
            }

            fn observe(
                &self,
                kind: Option<$crate::core::event::EventKind>,
                observer: $crate::reactivity::notifier::Observer<T>,
            ) -> $crate::reactivity::notifier::Subscription {
                self.inner.core.observe(kind, observer)
            }

            fn splice(&self, start: usize, delete_count: usize, values: Vec<T>) -> Vec<T> {
                self.inner.core.splice(start, delete_count, values)
            }

            fn set_at(&self, index: usize, value: T) -> Option<T> {
                self.inner.core.set_at(index, value)
            }

            fn move_item(&self, from: usize, to: usize) {
                self.inner.core.move_item(from, to)
            }

            fn notify_mutated_key(&self, key: &$crate::core::key::Key) {
                self.inner.core.notify_mutated_key(key)
            }
        }
    };
}

pub(crate) use delegate_to_core;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> Key {
        Key::from(k)
    }

    #[test]
    fn slots_insert_remove_replace() {
        let mut slots: Slots<i32> = Slots::default();
        assert_eq!(slots.insert(0, key("a"), 1), 0);
        assert_eq!(slots.insert(9, key("b"), 2), 1);
        assert_eq!(slots.insert(0, key("c"), 3), 0);

        assert_eq!(slots.to_vec(), vec![3, 1, 2]);
        assert_eq!(slots.position(&key("b")), Some(2));
        assert_eq!(slots.replace(&key("a"), 10), Some(1));
        assert_eq!(slots.replace(&key("z"), 10), None);
        assert_eq!(slots.remove(&key("c")), Some((0, 3)));
        assert_eq!(slots.remove(&key("c")), None);
        assert_eq!(slots.keys(), &[key("a"), key("b")]);
    }

    #[test]
    fn slots_from_items_skips_duplicate_keys() {
        let slots = Slots::from_items(vec![(key("a"), 1), (key("a"), 2), (key("b"), 3)]);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get_by_key(&key("a")), Some(&2));
    }

    struct Owner {
        core: ProjectionCore<i32>,
    }

    impl LengthAnnouncer for Owner {
        fn announce_length(&self) {
            self.core.announce_length();
        }
    }

    fn read_only(values: Vec<(Key, i32)>) -> Rc<Owner> {
        Rc::new_cyclic(|me: &Weak<Owner>| {
            let owner: Weak<dyn LengthAnnouncer> = me.clone();
            Owner {
                core: ProjectionCore::new(None, Slots::from_items(values), "groups", owner),
            }
        })
    }

    #[test]
    fn read_only_core_rejects_writes() {
        let owner = read_only(vec![(key("x"), 1)]);
        let core = &owner.core;

        assert!(core.splice(0, 1, vec![5]).is_empty());
        assert_eq!(core.set_at(0, 9), None);
        core.move_item(0, 0);
        core.notify_mutated_key(&key("x"));

        assert_eq!(core.get(0), Some(1));
        assert_eq!(core.len(), 1);
    }

    #[test]
    fn dispose_clears_and_announces() {
        let owner = read_only(vec![(key("x"), 1), (key("y"), 2)]);
        let log = Rc::new(RefCell::new(Vec::new()));
        let _sub = owner.core.observe(
            None,
            Rc::new({
                let log = log.clone();
                move |event: &ListEvent<i32>| log.borrow_mut().push(event.clone())
            }),
        );

        owner.core.dispose();
        owner.core.dispose();

        assert!(owner.core.is_disposed());
        assert_eq!(owner.core.len(), 0);
        assert_eq!(
            *log.borrow(),
            vec![ListEvent::Reset, ListEvent::LengthChanged { length: 0 }]
        );
    }
}
