// ============================================================================
// spark-lists - SortedList
// Live view of every upstream value, kept in stable comparator order
// ============================================================================
//
// Elements that compare equal are ordered by their current upstream index,
// which makes the view identical to a stable sort of the upstream at every
// point in time.
// ============================================================================

use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::collections::source::ObservableList;
use crate::core::context::LengthAnnouncer;
use crate::core::event::ListEvent;
use crate::core::key::Key;
use crate::projections::core::{delegate_to_core, upstream_items, ProjectionCore, Slots};
use crate::reactivity::batching::batch;

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

struct SortedInner<T> {
    core: ProjectionCore<T>,
    compare: Comparator<T>,
}

/// Every upstream value, stably sorted.
///
/// # Example
///
/// ```
/// use spark_lists::{list, ListExt};
///
/// let numbers = list(vec![2, 3, 4, 1]);
/// let sorted = numbers.create_sorted(|a, b| a.cmp(b));
/// assert_eq!(sorted.to_vec(), vec![1, 2, 3, 4]);
///
/// numbers.push(0);
/// assert_eq!(sorted.to_vec(), vec![0, 1, 2, 3, 4]);
/// ```
pub struct SortedList<T> {
    inner: Rc<SortedInner<T>>,
}

impl<T> Clone for SortedList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> SortedList<T> {
    pub fn new(
        upstream: Rc<dyn ObservableList<T>>,
        compare: impl Fn(&T, &T) -> Ordering + 'static,
    ) -> Self {
        let compare: Comparator<T> = Box::new(compare);
        let mut items = upstream_items(&*upstream);
        items.sort_by(|a, b| compare(&a.1, &b.1));
        let slots = Slots::from_items(items);
        let size = slots.len();

        let inner = Rc::new_cyclic(|me: &Weak<SortedInner<T>>| {
            let owner: Weak<dyn LengthAnnouncer> = me.clone();
            SortedInner {
                core: ProjectionCore::new(Some(upstream.clone()), slots, "sorted", owner),
                compare,
            }
        });

        let weak = Rc::downgrade(&inner);
        inner.core.attach(upstream.observe(
            None,
            Rc::new(move |event: &ListEvent<T>| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle(event);
                }
            }),
        ));

        debug!(list = %inner.core.label(), size, "created sorted projection");
        Self { inner }
    }

    /// Stop following the upstream and clear.
    pub fn dispose(&self) {
        self.inner.core.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }

    /// Re-sort the whole upstream and emit Reset.
    pub fn reevaluate(&self) {
        if !self.is_disposed() {
            batch(|| self.inner.reevaluate());
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.core.observer_count()
    }
}

impl<T: Clone + 'static> SortedInner<T> {
    fn upstream(&self) -> Option<&Rc<dyn ObservableList<T>>> {
        self.core.upstream()
    }

    fn handle(&self, event: &ListEvent<T>) {
        if self.core.is_disposed() {
            return;
        }
        batch(|| match event {
            ListEvent::Reset => self.reevaluate(),
            ListEvent::LengthChanged { .. } => {}
            ListEvent::Inserted { key, .. } => self.admit(key),
            ListEvent::Removed { key, .. } => self.evict(key),
            ListEvent::Changed { key, .. } => self.resort(key),
            ListEvent::Moved { key, .. } => self.reposition(key),
        });
    }

    fn reevaluate(&self) {
        let Some(upstream) = self.upstream() else {
            return;
        };
        let mut items = upstream_items(&**upstream);
        items.sort_by(|a, b| (self.compare)(&a.1, &b.1));
        debug!(list = %self.core.label(), size = items.len(), "re-sorted");
        self.core.replace_all(Slots::from_items(items));
    }

    /// Sorted position for `key` holding `value`; `key` must not be a slot.
    fn insertion_point(&self, key: &Key, value: &T) -> usize {
        let Some(upstream) = self.upstream() else {
            return 0;
        };
        let upstream_index = upstream.index_of_key(key);
        let slots = self.core.slots().borrow();
        slots.keys().partition_point(|candidate| {
            let Some(existing) = slots.get_by_key(candidate) else {
                return true;
            };
            match (self.compare)(existing, value) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => upstream.index_of_key(candidate) < upstream_index,
            }
        })
    }

    fn admit(&self, key: &Key) {
        let Some(value) = self.upstream().and_then(|upstream| upstream.get_by_key(key)) else {
            return;
        };
        if self.core.slots().borrow().contains(key) {
            return;
        }
        let at = self.insertion_point(key, &value);
        let index = self
            .core
            .slots()
            .borrow_mut()
            .insert(at, key.clone(), value.clone());
        self.core.emit(ListEvent::Inserted {
            index,
            key: key.clone(),
            value,
        });
        self.core.schedule_length();
    }

    fn evict(&self, key: &Key) {
        let removed = self.core.slots().borrow_mut().remove(key);
        if let Some((index, value)) = removed {
            self.core.emit(ListEvent::Removed {
                index,
                key: key.clone(),
                value,
            });
            self.core.schedule_length();
        }
    }

    fn resort(&self, key: &Key) {
        let Some(value) = self.upstream().and_then(|upstream| upstream.get_by_key(key)) else {
            return;
        };
        let removed = self.core.slots().borrow_mut().remove(key);
        let Some((old_index, old_value)) = removed else {
            self.admit(key);
            return;
        };

        let at = self.insertion_point(key, &value);
        let new_index = self
            .core
            .slots()
            .borrow_mut()
            .insert(at, key.clone(), value.clone());

        if new_index != old_index {
            self.core.emit(ListEvent::Moved {
                old_index,
                new_index,
                key: key.clone(),
                value: value.clone(),
            });
        }
        self.core.emit(ListEvent::Changed {
            index: new_index,
            key: key.clone(),
            old_value,
            new_value: value,
        });
    }

    fn reposition(&self, key: &Key) {
        let removed = self.core.slots().borrow_mut().remove(key);
        let Some((old_index, value)) = removed else {
            return;
        };
        let at = self.insertion_point(key, &value);
        let new_index = self
            .core
            .slots()
            .borrow_mut()
            .insert(at, key.clone(), value.clone());
        if new_index != old_index {
            self.core.emit(ListEvent::Moved {
                old_index,
                new_index,
                key: key.clone(),
                value,
            });
        }
    }
}

impl<T: Clone + 'static> LengthAnnouncer for SortedInner<T> {
    fn announce_length(&self) {
        self.core.announce_length();
    }
}

delegate_to_core!(SortedList<T>);

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for SortedList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedList")
            .field("values", &self.inner.core.slots().borrow().to_vec())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::list::list;
    use crate::collections::source::ListExt;
    use crate::core::event::EventKind;
    use std::cell::RefCell;

    fn ascending(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    fn record<L: ListExt<i32>>(list: &L) -> (Rc<RefCell<Vec<ListEvent<i32>>>>, crate::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = list.subscribe({
            let log = log.clone();
            move |event| log.borrow_mut().push(event.clone())
        });
        (log, sub)
    }

    #[test]
    fn initial_and_insert() {
        let numbers = list(vec![2, 3, 4, 1]);
        let sorted = numbers.create_sorted(ascending);
        assert_eq!(sorted.to_vec(), vec![1, 2, 3, 4]);

        let (log, _sub) = record(&sorted);
        numbers.push(0);

        assert_eq!(sorted.to_vec(), vec![0, 1, 2, 3, 4]);
        let log = log.borrow();
        assert!(matches!(&log[0], ListEvent::Inserted { index: 0, value: 0, .. }));
        assert_eq!(log[1], ListEvent::LengthChanged { length: 5 });
    }

    #[test]
    fn ties_follow_upstream_order() {
        let people = list(vec![(30, "ann"), (20, "bob"), (30, "cid"), (20, "dee")]);
        let by_age = people.create_sorted(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            by_age.to_vec(),
            vec![(20, "bob"), (20, "dee"), (30, "ann"), (30, "cid")]
        );

        people.unshift(vec![(20, "eve")]);
        people.push((30, "fay"));
        assert_eq!(
            by_age.to_vec(),
            vec![
                (20, "eve"),
                (20, "bob"),
                (20, "dee"),
                (30, "ann"),
                (30, "cid"),
                (30, "fay")
            ]
        );
    }

    #[test]
    fn upstream_move_reorders_equal_elements_only() {
        let people = list(vec![(1, 'a'), (2, 'b'), (1, 'c')]);
        let sorted = people.create_sorted(|a, b| a.0.cmp(&b.0));
        assert_eq!(sorted.to_vec(), vec![(1, 'a'), (1, 'c'), (2, 'b')]);

        let log = Rc::new(RefCell::new(Vec::new()));
        let _sub = sorted.subscribe({
            let log = log.clone();
            move |event| log.borrow_mut().push(event.clone())
        });

        // (2,'b') has no equal neighbours, so its upstream position is irrelevant
        people.move_item(1, 0);
        assert!(log.borrow().is_empty());

        // 'c' overtakes 'a' upstream
        people.move_item(2, 0);
        assert_eq!(sorted.to_vec(), vec![(1, 'c'), (1, 'a'), (2, 'b')]);
        assert!(matches!(
            &log.borrow()[0],
            ListEvent::Moved { old_index: 1, new_index: 0, .. }
        ));
    }

    #[test]
    fn change_that_moves_emits_moved_then_changed() {
        let numbers = list(vec![1, 2, 3]);
        let sorted = numbers.create_sorted(ascending);
        let (log, _sub) = record(&sorted);

        numbers.set_at(0, 5);

        assert_eq!(sorted.to_vec(), vec![2, 3, 5]);
        let key = numbers.key_at(0).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                ListEvent::Moved {
                    old_index: 0,
                    new_index: 2,
                    key: key.clone(),
                    value: 5
                },
                ListEvent::Changed {
                    index: 2,
                    key,
                    old_value: 1,
                    new_value: 5
                },
            ]
        );
    }

    #[test]
    fn change_in_place_emits_changed_only() {
        let numbers = list(vec![1, 5, 9]);
        let sorted = numbers.create_sorted(ascending);
        let (log, _sub) = record(&sorted);

        numbers.set_at(1, 6);

        let kinds: Vec<EventKind> = log.borrow().iter().map(ListEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::ItemChanged]);
    }

    #[test]
    fn removal() {
        let numbers = list(vec![3, 1, 2]);
        let sorted = numbers.create_sorted(ascending);
        numbers.remove_at(0);
        assert_eq!(sorted.to_vec(), vec![1, 2]);
    }

    #[test]
    fn upstream_reverse_resets_but_keeps_order() {
        let numbers = list(vec![3, 1, 2]);
        let sorted = numbers.create_sorted(ascending);
        let (log, _sub) = record(&sorted);

        numbers.reverse();

        assert_eq!(sorted.to_vec(), vec![1, 2, 3]);
        assert_eq!(*log.borrow(), vec![ListEvent::Reset]);
    }

    #[test]
    fn sorted_of_filtered() {
        let numbers = list(vec![8, 3, 6, 1, 4]);
        let evens = numbers.create_filtered(|n| n % 2 == 0);
        let sorted = evens.create_sorted(ascending);
        assert_eq!(sorted.to_vec(), vec![4, 6, 8]);

        numbers.push(2);
        numbers.set_at(1, 10);
        numbers.set_at(0, 7);
        assert_eq!(sorted.to_vec(), vec![2, 4, 6, 10]);
    }

    #[test]
    fn dispose_after_push() {
        let numbers = list(Vec::new());
        let sorted = numbers.create_sorted(ascending);
        numbers.push(3);
        numbers.push(1);

        let (log, _sub) = record(&sorted);
        sorted.dispose();

        assert_eq!(sorted.to_vec(), Vec::<i32>::new());
        assert_eq!(
            log.borrow().iter().filter(|e| e.kind() == EventKind::Reload).count(),
            1
        );

        numbers.push(2);
        assert_eq!(sorted.len(), 0);
    }

    #[test]
    fn push_through_sorted_lands_upstream() {
        let numbers = list(vec![5, 1]);
        let sorted = numbers.create_sorted(ascending);

        sorted.push(3);

        assert_eq!(numbers.to_vec(), vec![5, 1, 3]);
        assert_eq!(sorted.to_vec(), vec![1, 3, 5]);
    }
}
