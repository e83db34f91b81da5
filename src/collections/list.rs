// ============================================================================
// spark-lists - KeyedList
// An observable sequence whose slots carry stable, never-reused keys
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::collections::source::{ListExt, ObservableList};
use crate::core::context::LengthAnnouncer;
use crate::core::error::ListError;
use crate::core::event::{EventKind, ListEvent};
use crate::core::key::{Key, KeyGenerator};
use crate::core::options::ListOptions;
use crate::reactivity::batching::{batch, LengthAnnouncement};
use crate::reactivity::mirror::{replay, Replay};
use crate::reactivity::notifier::{Notifier, Observer, Subscription};

// =============================================================================
// STATE
// =============================================================================

/// Slot order plus key -> value storage.
struct ListState<T> {
    order: Vec<Key>,
    values: HashMap<Key, T>,
}

impl<T: Clone> ListState<T> {
    fn value_at(&self, index: usize) -> Option<&T> {
        self.order.get(index).and_then(|key| self.values.get(key))
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == key)
    }

    fn snapshot(&self) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|key| self.values.get(key).cloned())
            .collect()
    }
}

struct ListInner<T> {
    state: RefCell<ListState<T>>,
    keys: KeyGenerator,
    notifier: Notifier<T>,
    length: LengthAnnouncement,
    /// Keeps the proxy-mode mirror registered for the list's lifetime
    mirror: RefCell<Option<Subscription>>,
    me: Weak<ListInner<T>>,
}

impl<T: Clone + 'static> ListInner<T> {
    fn len(&self) -> usize {
        self.state.borrow().order.len()
    }

    fn emit(&self, event: ListEvent<T>) {
        self.notifier.emit(&event);
    }

    fn schedule_length(&self) {
        let me: Weak<dyn LengthAnnouncer> = self.me.clone();
        self.length.schedule(me);
    }

    /// Insert one slot and deliver its record.
    fn insert_one(&self, index: usize, value: T) -> Key {
        let key = self.keys.next_key();
        let index = {
            let mut state = self.state.borrow_mut();
            let index = index.min(state.order.len());
            state.order.insert(index, key.clone());
            state.values.insert(key.clone(), value.clone());
            index
        };
        self.emit(ListEvent::Inserted {
            index,
            key: key.clone(),
            value,
        });
        key
    }

    /// Remove one slot by key and deliver its record.
    fn remove_key(&self, key: &Key) -> Option<T> {
        let (index, value) = {
            let mut state = self.state.borrow_mut();
            let index = state.position(key)?;
            state.order.remove(index);
            let value = state.values.remove(key)?;
            (index, value)
        };
        self.emit(ListEvent::Removed {
            index,
            key: key.clone(),
            value: value.clone(),
        });
        Some(value)
    }
}

impl<T: Clone + 'static> LengthAnnouncer for ListInner<T> {
    fn announce_length(&self) {
        if let Some(length) = self.length.take_change(self.len()) {
            self.emit(ListEvent::LengthChanged { length });
        }
    }
}

// =============================================================================
// KEYED LIST
// =============================================================================

/// An observable list with per-slot keys.
///
/// Cloning a `KeyedList` creates a new handle to the **same** list.
///
/// Every mutator delivers its change records synchronously, one slot at a
/// time, followed by a single LengthChanged when the call changed the length.
///
/// # Example
///
/// ```
/// use spark_lists::{list, ListExt, ObservableList};
///
/// let numbers = list(vec![1, 2, 3]);
/// let first_key = numbers.key_at(0).unwrap();
///
/// numbers.push(4);
/// numbers.set_at(0, 10);
///
/// assert_eq!(numbers.to_vec(), vec![10, 2, 3, 4]);
/// assert_eq!(numbers.key_at(0), Some(first_key));
/// ```
pub struct KeyedList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for KeyedList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> KeyedList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::build(Vec::new(), "list")
    }

    /// Create a list holding `values`, each under a fresh key.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self::build(values, "list")
    }

    /// Create a list from values that may contain holes.
    ///
    /// Fails with [`ListError::Hole`] at the first `None`; nothing is created.
    pub fn from_sparse<I>(values: I) -> Result<Self, ListError>
    where
        I: IntoIterator<Item = Option<T>>,
    {
        let values = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| value.ok_or(ListError::Hole { index }))
            .collect::<Result<Vec<T>, ListError>>()
            .inspect_err(|err| debug!(%err, "rejected sparse initial values"))?;
        Ok(Self::from_vec(values))
    }

    /// Create a list configured by `options`.
    pub fn with_options(values: Vec<T>, options: ListOptions<T>) -> Self {
        let label = options.label.as_deref().unwrap_or("list");
        match options.proxy {
            Some(backing) => {
                let seed = backing.borrow().clone();
                if !values.is_empty() && !seed.is_empty() {
                    debug!(
                        list = %label,
                        ignored = values.len(),
                        seeded = seed.len(),
                        "proxy backing seeds the list; discarding passed values"
                    );
                }
                let list = Self::build(seed, label);
                let mirror = list.mirror_into(backing);
                *list.inner.mirror.borrow_mut() = Some(mirror);
                list
            }
            None => Self::build(values, label),
        }
    }

    fn build(values: Vec<T>, label: &str) -> Self {
        let keys = KeyGenerator::new();
        let mut order = Vec::with_capacity(values.len());
        let mut map = HashMap::with_capacity(values.len());
        for value in values {
            let key = keys.next_key();
            order.push(key.clone());
            map.insert(key, value);
        }
        let len = order.len();

        let inner = Rc::new_cyclic(|me| ListInner {
            state: RefCell::new(ListState { order, values: map }),
            keys,
            notifier: Notifier::new(label),
            length: LengthAnnouncement::new(len),
            mirror: RefCell::new(None),
            me: me.clone(),
        });
        Self { inner }
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Relocate the slot at `from` to `to`, keeping its key.
    ///
    /// `from` past the end is a no-op; `to` past the end moves to the end.
    pub fn move_to(&self, from: usize, to: usize) {
        let moved = {
            let mut state = self.inner.state.borrow_mut();
            let len = state.order.len();
            if from >= len {
                return;
            }
            let to = to.min(len - 1);
            if from == to {
                return;
            }
            let key = state.order.remove(from);
            state.order.insert(to, key.clone());
            state.values.get(&key).cloned().map(|value| (to, key, value))
        };

        if let Some((new_index, key, value)) = moved {
            self.inner.emit(ListEvent::Moved {
                old_index: from,
                new_index,
                key,
                value,
            });
        }
    }

    /// Stable sort by `compare`, then a single Reset.
    pub fn sort_by(&self, mut compare: impl FnMut(&T, &T) -> std::cmp::Ordering) {
        let mut entries: Vec<(Key, T)> = {
            let state = self.inner.state.borrow();
            state
                .order
                .iter()
                .filter_map(|key| state.values.get(key).map(|value| (key.clone(), value.clone())))
                .collect()
        };
        if entries.len() < 2 {
            return;
        }

        // The comparator is caller code; no borrow is held while it runs.
        entries.sort_by(|a, b| compare(&a.1, &b.1));

        {
            let mut state = self.inner.state.borrow_mut();
            if state.order.len() != entries.len() {
                return;
            }
            state.order = entries.into_iter().map(|(key, _)| key).collect();
        }
        self.inner.emit(ListEvent::Reset);
    }

    /// Stable sort in natural order.
    pub fn sort(&self)
    where
        T: Ord,
    {
        self.sort_by(T::cmp);
    }

    /// Reverse the slot order, then a single Reset.
    pub fn reverse(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.order.len() < 2 {
                return;
            }
            state.order.reverse();
        }
        self.inner.emit(ListEvent::Reset);
    }

    /// Drop trailing slots until `len` remain, last slot first.
    pub fn truncate(&self, len: usize) {
        batch(|| {
            loop {
                let last = {
                    let state = self.inner.state.borrow();
                    if state.order.len() <= len {
                        break;
                    }
                    state.order.last().cloned()
                };
                match last {
                    Some(key) => {
                        self.inner.remove_key(&key);
                    }
                    None => break,
                }
            }
            self.inner.schedule_length();
        });
    }

    /// Assign the length.
    ///
    /// Shrinking removes trailing slots with one Removed record each. Growing
    /// appends default-valued slots under fresh keys with no Inserted records,
    /// then delivers a Reset so observers pick up the new slots. A
    /// LengthChanged follows whenever the net length of the call differs. Negative, fractional, NaN and
    /// infinite lengths fail with [`ListError::InvalidLength`] and leave the
    /// list untouched.
    pub fn set_length(&self, length: f64) -> Result<(), ListError>
    where
        T: Default,
    {
        if !length.is_finite() || length < 0.0 || length.fract() != 0.0 || length > usize::MAX as f64 {
            debug!(list = %self.inner.notifier.label(), length, "rejected length assignment");
            return Err(ListError::InvalidLength { value: length });
        }

        let length = length as usize;
        let current = self.len();
        if length < current {
            self.truncate(length);
        } else if length > current {
            batch(|| {
                {
                    let mut state = self.inner.state.borrow_mut();
                    while state.order.len() < length {
                        let key = self.inner.keys.next_key();
                        state.order.push(key.clone());
                        state.values.insert(key, T::default());
                    }
                }
                self.inner.emit(ListEvent::Reset);
                self.inner.schedule_length();
            });
        }
        Ok(())
    }

    /// Deliver a Reset without changing anything.
    pub fn reload(&self) {
        self.inner.emit(ListEvent::Reset);
    }

    // =========================================================================
    // PROXY MODE
    // =========================================================================

    /// Keep `target` equal to this list's contents for as long as the
    /// returned subscription lives. `target` is overwritten immediately.
    pub fn mirror_into(&self, target: Rc<RefCell<Vec<T>>>) -> Subscription {
        *target.borrow_mut() = self.inner.state.borrow().snapshot();

        let list = Rc::downgrade(&self.inner);
        self.inner.notifier.subscribe(move |event| {
            let mut mirrored = target.borrow_mut();
            if replay(&mut mirrored, event) == Replay::NeedsResync {
                if let Some(list) = list.upgrade() {
                    *mirrored = list.state.borrow().snapshot();
                }
            }
        })
    }

    /// Number of keys this list has minted. Diagnostic only: keys are never
    /// reused, so this counts every slot the list has ever held.
    pub fn keys_minted(&self) -> u64 {
        self.inner.keys.minted()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.notifier.observer_count()
    }
}

impl<T: Clone + 'static> Default for KeyedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> FromIterator<T> for KeyedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for KeyedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("KeyedList")
            .field("label", &self.inner.notifier.label())
            .field("values", &state.snapshot())
            .field("len", &state.order.len())
            .finish()
    }
}

// =============================================================================
// OBSERVABLE LIST
// =============================================================================

impl<T: Clone + 'static> ObservableList<T> for KeyedList<T> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.inner.state.borrow().value_at(index).cloned()
    }

    fn key_at(&self, index: usize) -> Option<Key> {
        self.inner.state.borrow().order.get(index).cloned()
    }

    fn get_by_key(&self, key: &Key) -> Option<T> {
        self.inner.state.borrow().values.get(key).cloned()
    }

    fn index_of_key(&self, key: &Key) -> Option<usize> {
        let state = self.inner.state.borrow();
        if !state.values.contains_key(key) {
            return None;
        }
        state.position(key)
    }

    fn observe(&self, kind: Option<EventKind>, observer: Observer<T>) -> Subscription {
        self.inner.notifier.register(kind, observer)
    }

    fn splice(&self, start: usize, delete_count: usize, values: Vec<T>) -> Vec<T> {
        let (start, doomed, anchor) = {
            let state = self.inner.state.borrow();
            let len = state.order.len();
            let start = start.min(len);
            let end = start.saturating_add(delete_count).min(len);
            (
                start,
                state.order[start..end].to_vec(),
                state.order.get(end).cloned(),
            )
        };
        if doomed.is_empty() && values.is_empty() {
            return Vec::new();
        }

        batch(|| {
            // Targets are re-located by key after every delivery, so an
            // observer that mutates the list mid-splice cannot misdirect us.
            let removed: Vec<T> = doomed
                .iter()
                .filter_map(|key| self.inner.remove_key(key))
                .collect();

            let mut previous: Option<Key> = None;
            for value in values {
                let index = match &previous {
                    Some(key) => self.index_of_key(key).map(|index| index + 1),
                    None => anchor.as_ref().and_then(|key| self.index_of_key(key)),
                }
                .unwrap_or_else(|| start.min(self.len()));
                previous = Some(self.inner.insert_one(index, value));
            }

            self.inner.schedule_length();
            removed
        })
    }

    fn set_at(&self, index: usize, value: T) -> Option<T> {
        let replaced = {
            let mut state = self.inner.state.borrow_mut();
            let len = state.order.len();
            if index > len {
                return None;
            }
            if index == len {
                None
            } else {
                let key = state.order[index].clone();
                state
                    .values
                    .insert(key.clone(), value.clone())
                    .map(|old| (key, old))
            }
        };

        match replaced {
            Some((key, old)) => {
                self.inner.emit(ListEvent::Changed {
                    index,
                    key,
                    old_value: old.clone(),
                    new_value: value,
                });
                Some(old)
            }
            None => {
                self.push(value);
                None
            }
        }
    }

    fn move_item(&self, from: usize, to: usize) {
        self.move_to(from, to);
    }

    fn notify_mutated_key(&self, key: &Key) {
        let current = {
            let state = self.inner.state.borrow();
            state
                .position(key)
                .and_then(|index| state.values.get(key).map(|value| (index, value.clone())))
        };
        if let Some((index, value)) = current {
            self.inner.emit(ListEvent::Changed {
                index,
                key: key.clone(),
                old_value: value.clone(),
                new_value: value,
            });
        }
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Create a list holding `values`.
pub fn list<T: Clone + 'static>(values: Vec<T>) -> KeyedList<T> {
    KeyedList::from_vec(values)
}

/// Create a list with optional configuration.
pub fn list_with_options<T: Clone + 'static>(
    values: Vec<T>,
    options: Option<ListOptions<T>>,
) -> KeyedList<T> {
    match options {
        Some(options) => KeyedList::with_options(values, options),
        None => KeyedList::from_vec(values),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn record(list: &KeyedList<i32>) -> (Rc<RefCell<Vec<ListEvent<i32>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = list.subscribe({
            let log = log.clone();
            move |event| log.borrow_mut().push(event.clone())
        });
        (log, sub)
    }

    fn key(k: &str) -> Key {
        Key::from(k)
    }

    #[test]
    fn create_empty_list() {
        let list: KeyedList<i32> = KeyedList::new();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(list.get(0), None);
    }

    #[test]
    fn create_from_vec_mints_keys_in_order() {
        let list = KeyedList::from_vec(vec!["a", "b", "c"]);
        assert_eq!(list.keys(), vec![key("0"), key("1"), key("2")]);
        assert_eq!(list.get_by_key(&key("1")), Some("b"));
        assert_eq!(list.index_of_key(&key("2")), Some(2));
        assert_eq!(list.index_of_key(&key("9")), None);
    }

    #[test]
    fn from_sparse_rejects_holes() {
        let err = KeyedList::from_sparse(vec![Some(1), None, Some(3)]).unwrap_err();
        assert_eq!(err, ListError::Hole { index: 1 });

        let ok = KeyedList::from_sparse(vec![Some(1), Some(2)]).unwrap();
        assert_eq!(ok.to_vec(), vec![1, 2]);
    }

    #[test]
    fn push_emits_inserted_then_length() {
        let list = list(vec![1, 2, 3]);
        let (log, _sub) = record(&list);

        assert_eq!(list.push(4), 4);

        assert_eq!(list.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(
            *log.borrow(),
            vec![
                ListEvent::Inserted {
                    index: 3,
                    key: key("3"),
                    value: 4
                },
                ListEvent::LengthChanged { length: 4 },
            ]
        );
    }

    #[test]
    fn splice_removes_then_inserts() {
        let list = list(vec![0, 1, 2, 3, 4]);
        let (log, _sub) = record(&list);

        let removed = list.splice(1, 2, vec![10, 11, 12]);

        assert_eq!(removed, vec![1, 2]);
        assert_eq!(list.to_vec(), vec![0, 10, 11, 12, 3, 4]);

        let log = log.borrow();
        let kinds: Vec<EventKind> = log.iter().map(ListEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ItemRemoved,
                EventKind::ItemRemoved,
                EventKind::ItemInserted,
                EventKind::ItemInserted,
                EventKind::ItemInserted,
                EventKind::LengthChanged,
            ]
        );
        assert!(matches!(&log[0], ListEvent::Removed { index: 1, value: 1, .. }));
        assert!(matches!(&log[1], ListEvent::Removed { index: 1, value: 2, .. }));
        assert!(matches!(&log[2], ListEvent::Inserted { index: 1, value: 10, .. }));
        assert!(matches!(&log[3], ListEvent::Inserted { index: 2, value: 11, .. }));
        assert!(matches!(&log[4], ListEvent::Inserted { index: 3, value: 12, .. }));
        assert_eq!(log[5], ListEvent::LengthChanged { length: 6 });
    }

    #[test]
    fn balanced_splice_does_not_announce_length() {
        let list = list(vec![1, 2, 3]);
        let (log, _sub) = record(&list);

        list.splice(0, 1, vec![9]);

        assert_eq!(list.to_vec(), vec![9, 2, 3]);
        assert!(log
            .borrow()
            .iter()
            .all(|event| event.kind() != EventKind::LengthChanged));
    }

    #[test]
    fn set_at_keeps_key() {
        let list = list(vec![1, 2, 3]);
        let before = list.key_at(1);
        let (log, _sub) = record(&list);

        assert_eq!(list.set_at(1, 20), Some(2));

        assert_eq!(list.key_at(1), before);
        assert_eq!(
            *log.borrow(),
            vec![ListEvent::Changed {
                index: 1,
                key: key("1"),
                old_value: 2,
                new_value: 20
            }]
        );
    }

    #[test]
    fn set_at_length_appends() {
        let list = list(vec![1]);
        let (log, _sub) = record(&list);

        assert_eq!(list.set_at(1, 2), None);
        assert_eq!(list.to_vec(), vec![1, 2]);
        assert_eq!(log.borrow()[0].kind(), EventKind::ItemInserted);

        assert_eq!(list.set_at(5, 9), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn pop_shift_unshift() {
        let list = list(vec![1, 2, 3]);
        assert_eq!(list.pop(), Some(3));
        assert_eq!(list.shift(), Some(1));
        assert_eq!(list.unshift(vec![7, 8]), 3);
        assert_eq!(list.to_vec(), vec![7, 8, 2]);

        let empty: KeyedList<i32> = KeyedList::new();
        assert_eq!(empty.pop(), None);
        assert_eq!(empty.shift(), None);
    }

    #[test]
    fn move_preserves_key_and_emits_moved() {
        let list = list(vec![1, 2, 3]);
        let moved_key = list.key_at(0).unwrap();
        let (log, _sub) = record(&list);

        list.move_item(0, 1);

        assert_eq!(list.to_vec(), vec![2, 1, 3]);
        assert_eq!(list.key_at(1), Some(moved_key.clone()));
        assert_eq!(
            *log.borrow(),
            vec![ListEvent::Moved {
                old_index: 0,
                new_index: 1,
                key: moved_key,
                value: 1
            }]
        );
    }

    #[test]
    fn move_clamps_destination_and_ignores_bad_source() {
        let list = list(vec![1, 2, 3]);
        list.move_item(0, 99);
        assert_eq!(list.to_vec(), vec![2, 3, 1]);

        let (log, _sub) = record(&list);
        list.move_item(7, 0);
        list.move_item(1, 1);
        assert_eq!(list.to_vec(), vec![2, 3, 1]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn sort_is_stable_and_resets() {
        let list = list(vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]);
        let keys_by_value: HashMap<(i32, char), Key> = list
            .items()
            .into_iter()
            .map(|item| (item.data, item.key))
            .collect();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _sub = list.subscribe({
            let log = log.clone();
            move |event: &ListEvent<(i32, char)>| log.borrow_mut().push(event.kind())
        });

        list.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(list.to_vec(), vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
        assert_eq!(*log.borrow(), vec![EventKind::Reload]);
        for item in list.items() {
            assert_eq!(keys_by_value[&item.data], item.key);
        }
    }

    #[test]
    fn reverse_resets() {
        let list = list(vec![1, 2, 3]);
        let (log, _sub) = record(&list);
        list.reverse();
        assert_eq!(list.to_vec(), vec![3, 2, 1]);
        assert_eq!(*log.borrow(), vec![ListEvent::Reset]);
    }

    #[test]
    fn set_length_shrinks_with_removals() {
        let list = list(vec![1, 2, 3, 4]);
        let (log, _sub) = record(&list);

        list.set_length(2.0).unwrap();

        assert_eq!(list.to_vec(), vec![1, 2]);
        let log = log.borrow();
        assert!(matches!(&log[0], ListEvent::Removed { index: 3, value: 4, .. }));
        assert!(matches!(&log[1], ListEvent::Removed { index: 2, value: 3, .. }));
        assert_eq!(log[2], ListEvent::LengthChanged { length: 2 });
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn set_length_growth_resets_observers() {
        let list = list(vec![1]);
        let (log, _sub) = record(&list);

        list.set_length(3.0).unwrap();

        assert_eq!(list.to_vec(), vec![1, 0, 0]);
        assert_eq!(
            *log.borrow(),
            vec![ListEvent::Reset, ListEvent::LengthChanged { length: 3 }]
        );
        assert_eq!(list.keys_minted(), 3);
    }

    #[test]
    fn set_length_rejects_invalid_values() {
        let list = list(vec![1, 2]);
        let (log, _sub) = record(&list);

        for bad in [-1.0, f64::NAN, f64::INFINITY, 1.5] {
            let err = list.set_length(bad).unwrap_err();
            assert!(err.is_invalid_argument());
        }

        assert_eq!(list.to_vec(), vec![1, 2]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn keys_are_never_reused() {
        let list = list(vec![1]);
        let first = list.key_at(0).unwrap();
        list.pop();
        list.push(1);
        assert_ne!(list.key_at(0), Some(first));
    }

    #[test]
    fn notify_mutated_emits_changed_with_current_value() {
        let list = list(vec![5]);
        let (log, _sub) = record(&list);

        list.notify_mutated(0);
        list.notify_mutated(4);

        assert_eq!(
            *log.borrow(),
            vec![ListEvent::Changed {
                index: 0,
                key: key("0"),
                old_value: 5,
                new_value: 5
            }]
        );
    }

    #[test]
    fn update_rewrites_through_set_at() {
        let list = list(vec![vec![1], vec![2]]);
        assert!(list.update(1, |v| v.push(3)));
        assert!(!list.update(9, |v| v.push(3)));
        assert_eq!(list.to_vec(), vec![vec![1], vec![2, 3]]);
    }

    #[test]
    fn proxy_mode_mirrors_backing_vec() {
        let backing = Rc::new(RefCell::new(vec![3, 1, 2]));
        let list = KeyedList::with_options(Vec::new(), ListOptions::proxy(backing.clone()));

        assert_eq!(list.to_vec(), vec![3, 1, 2]);

        list.push(4);
        list.set_at(0, 30);
        list.move_item(0, 3);
        list.shift();
        assert_eq!(*backing.borrow(), list.to_vec());

        list.sort();
        assert_eq!(*backing.borrow(), vec![2, 4, 30]);
    }

    #[test]
    fn proxy_backing_seeds_over_passed_values() {
        let backing = Rc::new(RefCell::new(vec![7, 8]));
        let list = KeyedList::with_options(vec![1, 2, 3], ListOptions::proxy(backing.clone()));

        assert_eq!(list.to_vec(), vec![7, 8]);
        assert_eq!(*backing.borrow(), vec![7, 8]);
    }

    #[test]
    fn reentrant_mutation_from_observer() {
        let list = list(vec![1, 2, 3]);
        let fired = Rc::new(Cell::new(false));

        let _sub = list.on(EventKind::ItemRemoved, {
            let list = list.clone();
            let fired = fired.clone();
            move |_| {
                if !fired.replace(true) {
                    list.push(100);
                }
            }
        });

        let removed = list.splice(0, 2, vec![7]);

        assert_eq!(removed, vec![1, 2]);
        assert_eq!(list.to_vec(), vec![7, 3, 100]);
        for (index, key) in list.keys().iter().enumerate() {
            assert_eq!(list.index_of_key(key), Some(index));
        }
    }

    #[test]
    fn traversal_helpers() {
        let list = list(vec![1, 2, 3, 2]);
        assert_eq!(list.index_of(&2, None), Some(1));
        assert_eq!(list.index_of(&2, Some(2)), Some(3));
        assert_eq!(list.index_of(&2, Some(-1)), Some(3));
        assert_eq!(list.index_of(&9, None), None);
        assert_eq!(list.last_index_of(&2, None), Some(3));
        assert_eq!(list.last_index_of(&2, Some(2)), Some(1));
        assert_eq!(list.last_index_of(&2, Some(-5)), None);
        assert_eq!(list.map(|v, _| v * 10), vec![10, 20, 30, 20]);
        assert_eq!(list.filter(|v, _| *v > 1), vec![2, 3, 2]);
        assert!(list.some(|v, _| *v == 3));
        assert!(!list.every(|v, _| *v == 3));
        assert_eq!(list.reduce(0, |acc, v, _| acc + v), 8);
        assert_eq!(
            list.reduce_right(String::new(), |acc, v, _| format!("{acc}{v}")),
            "2321"
        );
        assert_eq!(list.slice(1, Some(-1)), vec![2, 3]);
        assert_eq!(list.slice(-2, None), vec![3, 2]);
        assert_eq!(list.join(","), "1,2,3,2");
        assert_eq!(list.concat(&[5]), vec![1, 2, 3, 2, 5]);

        let mut seen = Vec::new();
        list.for_each(|v, i| seen.push((i, *v)));
        assert_eq!(seen, vec![(0, 1), (1, 2), (2, 3), (3, 2)]);
    }

    #[test]
    fn get_item_pairs_key_and_data() {
        let list = list(vec!["x"]);
        let item = list.get_item(0).unwrap();
        assert_eq!(item.key, key("0"));
        assert_eq!(item.data, "x");
        assert_eq!(list.get_item_from_key(&key("0")), Some(item));
        assert_eq!(list.get_item(1), None);
    }

    #[test]
    fn debug_format() {
        let list = list_with_options(vec![1, 2], Some(ListOptions::default().with_label("nums")));
        let debug = format!("{:?}", list);
        assert!(debug.contains("KeyedList"));
        assert!(debug.contains("nums"));
        assert!(debug.contains("[1, 2]"));
    }
}
