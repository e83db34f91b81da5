// ============================================================================
// spark-lists - Observable List Interface
// The read/subscribe/write contract shared by lists and their projections
// ============================================================================
//
// `ObservableList` is the object-safe seam: projections hold their upstream
// as `Rc<dyn ObservableList<T>>`, which is what lets a projection be built on
// top of another projection. `ListExt` layers the array-style conveniences,
// traversal helpers and projection factories on top of it.
// ============================================================================

use std::cmp::Ordering;
use std::fmt::Display;
use std::rc::Rc;

use crate::core::event::{EventKind, Item, ListEvent};
use crate::core::key::Key;
use crate::projections::{FilteredList, GroupedList, SortedList};
use crate::reactivity::notifier::{Observer, Subscription};

// =============================================================================
// OBSERVABLE LIST
// =============================================================================

/// A keyed, observable sequence.
///
/// Reads return clones; a miss is `None`, never a panic. Writes are
/// positional and deliver their change records before returning.
pub trait ObservableList<T>: 'static {
    /// Number of slots.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`.
    fn get(&self, index: usize) -> Option<T>;

    /// Key of the slot at `index`.
    fn key_at(&self, index: usize) -> Option<Key>;

    /// Value of the slot with `key`.
    fn get_by_key(&self, key: &Key) -> Option<T>;

    /// Current position of the slot with `key`.
    fn index_of_key(&self, key: &Key) -> Option<usize>;

    /// Register an observer for one kind of record, or all of them.
    fn observe(&self, kind: Option<EventKind>, observer: Observer<T>) -> Subscription;

    /// Remove `delete_count` slots at `start`, then insert `values` there.
    /// Returns the removed values. `start` is clamped to the length.
    fn splice(&self, start: usize, delete_count: usize, values: Vec<T>) -> Vec<T>;

    /// Replace the value at `index` keeping its key. `index == len` appends.
    /// Returns the replaced value.
    fn set_at(&self, index: usize, value: T) -> Option<T>;

    /// Relocate the slot at `from` so that it ends up at `to`.
    fn move_item(&self, from: usize, to: usize);

    /// Signal that the value behind `key` changed without going through
    /// `set_at`.
    fn notify_mutated_key(&self, key: &Key);
}

impl<T: 'static, L: ObservableList<T> + ?Sized> ObservableList<T> for Rc<L> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Option<T> {
        (**self).get(index)
    }

    fn key_at(&self, index: usize) -> Option<Key> {
        (**self).key_at(index)
    }

    fn get_by_key(&self, key: &Key) -> Option<T> {
        (**self).get_by_key(key)
    }

    fn index_of_key(&self, key: &Key) -> Option<usize> {
        (**self).index_of_key(key)
    }

    fn observe(&self, kind: Option<EventKind>, observer: Observer<T>) -> Subscription {
        (**self).observe(kind, observer)
    }

    fn splice(&self, start: usize, delete_count: usize, values: Vec<T>) -> Vec<T> {
        (**self).splice(start, delete_count, values)
    }

    fn set_at(&self, index: usize, value: T) -> Option<T> {
        (**self).set_at(index, value)
    }

    fn move_item(&self, from: usize, to: usize) {
        (**self).move_item(from, to)
    }

    fn notify_mutated_key(&self, key: &Key) {
        (**self).notify_mutated_key(key)
    }
}

// =============================================================================
// INDEX NORMALIZATION
// =============================================================================

/// Resolve an array-style relative index: negative counts back from the end.
/// The result is clamped to `0..=len`.
pub fn relative_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

// =============================================================================
// LIST EXT
// =============================================================================

/// Conveniences available on every list handle.
pub trait ListExt<T: Clone + 'static>: ObservableList<T> + Clone + Sized {
    // =========================================================================
    // SUBSCRIPTION
    // =========================================================================

    /// Observe every record.
    fn subscribe(&self, observer: impl Fn(&ListEvent<T>) + 'static) -> Subscription {
        self.observe(None, Rc::new(observer))
    }

    /// Observe one kind of record.
    fn on(&self, kind: EventKind, observer: impl Fn(&ListEvent<T>) + 'static) -> Subscription {
        self.observe(Some(kind), Rc::new(observer))
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Append one value. Returns the new length.
    fn push(&self, value: T) -> usize {
        self.splice(self.len(), 0, vec![value]);
        self.len()
    }

    /// Append several values. Returns the new length.
    fn extend<I: IntoIterator<Item = T>>(&self, values: I) -> usize {
        let values: Vec<T> = values.into_iter().collect();
        if !values.is_empty() {
            self.splice(self.len(), 0, values);
        }
        self.len()
    }

    /// Remove and return the last value.
    fn pop(&self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.splice(len - 1, 1, Vec::new()).pop()
    }

    /// Remove and return the first value.
    fn shift(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.splice(0, 1, Vec::new()).pop()
    }

    /// Prepend values, keeping their order. Returns the new length.
    fn unshift<I: IntoIterator<Item = T>>(&self, values: I) -> usize {
        let values: Vec<T> = values.into_iter().collect();
        if !values.is_empty() {
            self.splice(0, 0, values);
        }
        self.len()
    }

    fn insert(&self, index: usize, value: T) {
        self.splice(index, 0, vec![value]);
    }

    fn remove_at(&self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }
        self.splice(index, 1, Vec::new()).pop()
    }

    /// Signal an in-place change to the value at `index`.
    fn notify_mutated(&self, index: usize) {
        if let Some(key) = self.key_at(index) {
            self.notify_mutated_key(&key);
        }
    }

    /// Modify the value at `index` and write it back through `set_at`.
    /// Returns false when `index` is out of range.
    fn update(&self, index: usize, f: impl FnOnce(&mut T)) -> bool {
        let Some(mut value) = self.get(index) else {
            return false;
        };
        f(&mut value);
        self.set_at(index, value);
        true
    }

    // =========================================================================
    // READERS
    // =========================================================================

    fn get_item(&self, index: usize) -> Option<Item<T>> {
        Some(Item::new(self.key_at(index)?, self.get(index)?))
    }

    fn get_item_from_key(&self, key: &Key) -> Option<Item<T>> {
        self.get_by_key(key).map(|data| Item::new(key.clone(), data))
    }

    /// Snapshot of the values.
    fn to_vec(&self) -> Vec<T> {
        (0..self.len()).filter_map(|index| self.get(index)).collect()
    }

    /// Snapshot of the keys.
    fn keys(&self) -> Vec<Key> {
        (0..self.len()).filter_map(|index| self.key_at(index)).collect()
    }

    /// Snapshot of the slots.
    fn items(&self) -> Vec<Item<T>> {
        (0..self.len()).filter_map(|index| self.get_item(index)).collect()
    }

    /// First index of `value` at or after `from_index` (negative counts from
    /// the end).
    fn index_of(&self, value: &T, from_index: Option<isize>) -> Option<usize>
    where
        T: PartialEq,
    {
        let values = self.to_vec();
        let start = relative_index(from_index.unwrap_or(0), values.len());
        values
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, candidate)| *candidate == value)
            .map(|(index, _)| index)
    }

    /// Last index of `value` at or before `from_index` (negative counts from
    /// the end).
    fn last_index_of(&self, value: &T, from_index: Option<isize>) -> Option<usize>
    where
        T: PartialEq,
    {
        let values = self.to_vec();
        let len = values.len() as isize;
        let from = match from_index {
            None => len - 1,
            Some(index) if index < 0 => len + index,
            Some(index) => index.min(len - 1),
        };
        if from < 0 {
            return None;
        }
        (0..=from.unsigned_abs())
            .rev()
            .find(|&index| values[index] == *value)
    }

    fn for_each(&self, mut f: impl FnMut(&T, usize)) {
        for (index, value) in self.to_vec().iter().enumerate() {
            f(value, index);
        }
    }

    fn map<U>(&self, mut f: impl FnMut(&T, usize) -> U) -> Vec<U> {
        self.to_vec()
            .iter()
            .enumerate()
            .map(|(index, value)| f(value, index))
            .collect()
    }

    fn filter(&self, mut f: impl FnMut(&T, usize) -> bool) -> Vec<T> {
        self.to_vec()
            .into_iter()
            .enumerate()
            .filter(|(index, value)| f(value, *index))
            .map(|(_, value)| value)
            .collect()
    }

    fn some(&self, mut f: impl FnMut(&T, usize) -> bool) -> bool {
        self.to_vec()
            .iter()
            .enumerate()
            .any(|(index, value)| f(value, index))
    }

    fn every(&self, mut f: impl FnMut(&T, usize) -> bool) -> bool {
        self.to_vec()
            .iter()
            .enumerate()
            .all(|(index, value)| f(value, index))
    }

    fn reduce<A>(&self, initial: A, mut f: impl FnMut(A, &T, usize) -> A) -> A {
        self.to_vec()
            .iter()
            .enumerate()
            .fold(initial, |acc, (index, value)| f(acc, value, index))
    }

    fn reduce_right<A>(&self, initial: A, mut f: impl FnMut(A, &T, usize) -> A) -> A {
        self.to_vec()
            .iter()
            .enumerate()
            .rev()
            .fold(initial, |acc, (index, value)| f(acc, value, index))
    }

    /// Values in `begin..end`, both relative (negative counts from the end).
    fn slice(&self, begin: isize, end: Option<isize>) -> Vec<T> {
        let values = self.to_vec();
        let len = values.len();
        let begin = relative_index(begin, len);
        let end = end.map_or(len, |end| relative_index(end, len));
        if end <= begin {
            return Vec::new();
        }
        values[begin..end].to_vec()
    }

    fn join(&self, separator: &str) -> String
    where
        T: Display,
    {
        self.to_vec()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// The values followed by `other`.
    fn concat(&self, other: &[T]) -> Vec<T> {
        let mut values = self.to_vec();
        values.extend_from_slice(other);
        values
    }

    // =========================================================================
    // PROJECTION FACTORIES
    // =========================================================================

    /// Live view of the values for which `predicate` holds.
    fn create_filtered(&self, predicate: impl Fn(&T) -> bool + 'static) -> FilteredList<T> {
        FilteredList::new(Rc::new(self.clone()), predicate)
    }

    /// Live view of every value, stably ordered by `compare`.
    fn create_sorted(&self, compare: impl Fn(&T, &T) -> Ordering + 'static) -> SortedList<T> {
        SortedList::new(Rc::new(self.clone()), compare)
    }

    /// Live view clustering values by `group_key`; groups are ordered by key.
    fn create_grouped<G, K>(
        &self,
        group_key: impl Fn(&T) -> K + 'static,
        group_data: impl Fn(&T) -> G + 'static,
    ) -> GroupedList<T, G>
    where
        G: Clone + 'static,
        K: Into<Key>,
    {
        GroupedList::new(Rc::new(self.clone()), group_key, group_data, Key::cmp)
    }

    /// Like [`create_grouped`](ListExt::create_grouped) with a custom group
    /// order.
    fn create_grouped_by<G, K>(
        &self,
        group_key: impl Fn(&T) -> K + 'static,
        group_data: impl Fn(&T) -> G + 'static,
        group_compare: impl Fn(&Key, &Key) -> Ordering + 'static,
    ) -> GroupedList<T, G>
    where
        G: Clone + 'static,
        K: Into<Key>,
    {
        GroupedList::new(Rc::new(self.clone()), group_key, group_data, group_compare)
    }
}

impl<T: Clone + 'static, L: ObservableList<T> + Clone> ListExt<T> for L {}

// =============================================================================
// TESTS
// =============================================================================
