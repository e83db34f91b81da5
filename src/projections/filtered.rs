// ============================================================================
// spark-lists - FilteredList
// Live view of the upstream values that satisfy a predicate
// ============================================================================

use std::rc::{Rc, Weak};

use tracing::debug;

use crate::collections::source::ObservableList;
use crate::core::context::LengthAnnouncer;
use crate::core::event::ListEvent;
use crate::core::key::Key;
use crate::projections::core::{delegate_to_core, upstream_items, ProjectionCore, Slots};
use crate::reactivity::batching::batch;

type Predicate<T> = Box<dyn Fn(&T) -> bool>;

struct FilteredInner<T> {
    core: ProjectionCore<T>,
    predicate: Predicate<T>,
}

/// Members of the upstream for which the predicate holds, in upstream order.
///
/// Membership is re-checked on every Inserted and Changed record, so values
/// cross in and out of the view as they change. Writes go to the upstream.
///
/// # Example
///
/// ```
/// use spark_lists::{list, ListExt, ObservableList};
///
/// let numbers = list(vec![1, 2, 3, 4]);
/// let evens = numbers.create_filtered(|n| n % 2 == 0);
/// assert_eq!(evens.to_vec(), vec![2, 4]);
///
/// numbers.set_at(0, 10);
/// assert_eq!(evens.to_vec(), vec![10, 2, 4]);
/// ```
pub struct FilteredList<T> {
    inner: Rc<FilteredInner<T>>,
}

impl<T> Clone for FilteredList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> FilteredList<T> {
    pub fn new(upstream: Rc<dyn ObservableList<T>>, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        let predicate: Predicate<T> = Box::new(predicate);
        let slots = Slots::from_items(
            upstream_items(&*upstream)
                .into_iter()
                .filter(|(_, value)| predicate(value)),
        );
        let members = slots.len();

        let inner = Rc::new_cyclic(|me: &Weak<FilteredInner<T>>| {
            let owner: Weak<dyn LengthAnnouncer> = me.clone();
            FilteredInner {
                core: ProjectionCore::new(Some(upstream.clone()), slots, "filtered", owner),
                predicate,
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

        debug!(list = %inner.core.label(), members, "created filtered projection");
        Self { inner }
    }

    /// Stop following the upstream and clear.
    pub fn dispose(&self) {
        self.inner.core.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }

    /// Re-run the predicate over the whole upstream and emit Reset.
    pub fn reevaluate(&self) {
        if !self.is_disposed() {
            batch(|| self.inner.reevaluate());
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.core.observer_count()
    }
}

impl<T: Clone + 'static> FilteredInner<T> {
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
            ListEvent::Changed { key, .. } => self.recheck(key),
            ListEvent::Moved { key, .. } => self.reposition(key),
        });
    }

    fn reevaluate(&self) {
        let Some(upstream) = self.upstream() else {
            return;
        };
        let slots = Slots::from_items(
            upstream_items(&**upstream)
                .into_iter()
                .filter(|(_, value)| (self.predicate)(value)),
        );
        debug!(list = %self.core.label(), members = slots.len(), "re-evaluated filter");
        self.core.replace_all(slots);
    }

    /// Where `key` belongs: right after the nearest earlier upstream member.
    fn insertion_point(&self, key: &Key) -> usize {
        let Some(upstream) = self.upstream() else {
            return 0;
        };
        let Some(upstream_index) = upstream.index_of_key(key) else {
            return self.core.len();
        };
        let slots = self.core.slots().borrow();
        (0..upstream_index)
            .rev()
            .filter_map(|index| upstream.key_at(index))
            .find_map(|earlier| slots.position(&earlier))
            .map_or(0, |position| position + 1)
    }

    fn admit(&self, key: &Key) {
        let Some(value) = self.upstream().and_then(|upstream| upstream.get_by_key(key)) else {
            return;
        };
        if self.core.slots().borrow().contains(key) || !(self.predicate)(&value) {
            return;
        }
        self.insert_member(key, value);
    }

    fn insert_member(&self, key: &Key, value: T) {
        let at = self.insertion_point(key);
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

    fn recheck(&self, key: &Key) {
        let Some(value) = self.upstream().and_then(|upstream| upstream.get_by_key(key)) else {
            return;
        };
        let keep = (self.predicate)(&value);
        let member = self.core.slots().borrow().contains(key);

        match (member, keep) {
            (true, true) => {
                let changed = {
                    let mut slots = self.core.slots().borrow_mut();
                    let index = slots.position(key);
                    let old = slots.replace(key, value.clone());
                    index.zip(old)
                };
                if let Some((index, old_value)) = changed {
                    self.core.emit(ListEvent::Changed {
                        index,
                        key: key.clone(),
                        old_value,
                        new_value: value,
                    });
                }
            }
            (true, false) => self.evict(key),
            (false, true) => self.insert_member(key, value),
            (false, false) => {}
        }
    }

    fn reposition(&self, key: &Key) {
        let removed = self.core.slots().borrow_mut().remove(key);
        let Some((old_index, value)) = removed else {
            return;
        };
        let at = self.insertion_point(key);
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

impl<T: Clone + 'static> LengthAnnouncer for FilteredInner<T> {
    fn announce_length(&self) {
        self.core.announce_length();
    }
}

delegate_to_core!(FilteredList<T>);

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for FilteredList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredList")
            .field("values", &self.inner.core.slots().borrow().to_vec())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
