// ============================================================================
// spark-lists - GroupedList
// Live view clustering upstream values into contiguous groups
// ============================================================================
//
// Two lists are maintained side by side:
//
// - the grouped list itself: every upstream value, groups laid out one after
//   another in group order, members of a group in upstream order
// - `.groups`: one slot per distinct group, keyed by the group key, holding
//   the group data of the group's first member (the group head)
//
// For every upstream record both sides are brought up to date first; the
// element records are then delivered, followed by the `.groups` records.
// ============================================================================

use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::collections::source::ObservableList;
use crate::core::context::LengthAnnouncer;
use crate::core::event::ListEvent;
use crate::core::key::Key;
use crate::projections::core::{delegate_to_core, upstream_items, ProjectionCore, Slots};
use crate::reactivity::batching::batch;

type GroupKeyFn<T> = Box<dyn Fn(&T) -> Key>;
type GroupDataFn<T, G> = Box<dyn Fn(&T) -> G>;
type GroupOrder = Box<dyn Fn(&Key, &Key) -> Ordering>;

// =============================================================================
// GROUPS LIST
// =============================================================================

struct GroupsInner<T> {
    core: ProjectionCore<T>,
    /// Group key -> key of the group's first member
    heads: RefCell<HashMap<Key, Key>>,
}

impl<T: Clone + 'static> LengthAnnouncer for GroupsInner<T> {
    fn announce_length(&self) {
        self.core.announce_length();
    }
}

/// The `.groups` side of a [`GroupedList`]: one slot per group, in group
/// order, keyed by group key.
///
/// Read-only. Its write methods log a warning and do nothing. A `GroupsList`
/// keeps its grouped list alive, so it stays live on its own.
pub struct GroupsList<T> {
    inner: Rc<GroupsInner<T>>,
    _owner: Rc<dyn Any>,
}

impl<T> Clone for GroupsList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            _owner: Rc::clone(&self._owner),
        }
    }
}

impl<T: Clone + 'static> GroupsList<T> {
    /// Key of the element heading `group`.
    pub fn first_key(&self, group: &Key) -> Option<Key> {
        self.inner.heads.borrow().get(group).cloned()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.core.observer_count()
    }
}

delegate_to_core!(GroupsList<T>);

impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for GroupsList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.inner.core.slots().borrow();
        f.debug_map()
            .entries(slots.keys().iter().zip(slots.to_vec()))
            .finish()
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Group sizes plus element -> group membership.
#[derive(Default)]
struct Membership {
    group_of: HashMap<Key, Key>,
    sizes: HashMap<Key, usize>,
}

/// A complete grouping of some upstream contents.
struct Layout<T, G> {
    elements: Slots<T>,
    groups: Slots<G>,
    heads: HashMap<Key, Key>,
    membership: Membership,
}

/// Records produced while handling one upstream record.
struct Pending<T, G> {
    elements: Vec<ListEvent<T>>,
    groups: Vec<ListEvent<G>>,
    elements_resized: bool,
    groups_resized: bool,
}

impl<T, G> Default for Pending<T, G> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            groups: Vec::new(),
            elements_resized: false,
            groups_resized: false,
        }
    }
}

// =============================================================================
// GROUPED LIST
// =============================================================================

struct GroupedInner<T, G> {
    core: ProjectionCore<T>,
    groups: Rc<GroupsInner<G>>,
    membership: RefCell<Membership>,
    group_key: GroupKeyFn<T>,
    group_data: GroupDataFn<T, G>,
    group_order: GroupOrder,
}

/// Every upstream value, clustered by group key.
///
/// Groups never interleave. Within a group, members keep their upstream
/// order. A value whose group key changes leaves its old group (Removed) and
/// joins its new one (Inserted).
///
/// # Example
///
/// ```
/// use spark_lists::{list, ListExt};
///
/// let numbers = list(vec![1, 2, 3, 4]);
/// let parity = |n: &i32| if n % 2 == 0 { "even" } else { "odd" };
/// let grouped = numbers.create_grouped(parity, parity);
///
/// assert_eq!(grouped.to_vec(), vec![2, 4, 1, 3]);
/// assert_eq!(grouped.groups().to_vec(), vec!["even", "odd"]);
/// ```
pub struct GroupedList<T, G> {
    inner: Rc<GroupedInner<T, G>>,
}

impl<T, G> Clone for GroupedList<T, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static, G: Clone + 'static> GroupedList<T, G> {
    pub fn new<K: Into<Key>>(
        upstream: Rc<dyn ObservableList<T>>,
        group_key: impl Fn(&T) -> K + 'static,
        group_data: impl Fn(&T) -> G + 'static,
        group_order: impl Fn(&Key, &Key) -> Ordering + 'static,
    ) -> Self {
        let group_key: GroupKeyFn<T> = Box::new(move |value| group_key(value).into());
        let group_data: GroupDataFn<T, G> = Box::new(group_data);
        let group_order: GroupOrder = Box::new(group_order);

        let layout = partition(
            upstream_items(&*upstream),
            &group_key,
            &group_data,
            &group_order,
        );
        let (size, group_count) = (layout.elements.len(), layout.groups.len());

        let groups = Rc::new_cyclic(|me: &Weak<GroupsInner<G>>| {
            let owner: Weak<dyn LengthAnnouncer> = me.clone();
            GroupsInner {
                core: ProjectionCore::new(None, layout.groups, "groups", owner),
                heads: RefCell::new(layout.heads),
            }
        });

        let inner = Rc::new_cyclic(|me: &Weak<GroupedInner<T, G>>| {
            let owner: Weak<dyn LengthAnnouncer> = me.clone();
            GroupedInner {
                core: ProjectionCore::new(Some(upstream.clone()), layout.elements, "grouped", owner),
                groups,
                membership: RefCell::new(layout.membership),
                group_key,
                group_data,
                group_order,
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

        debug!(list = %inner.core.label(), size, groups = group_count, "created grouped projection");
        Self { inner }
    }

    /// The groups, in group order, valued by their heads.
    pub fn groups(&self) -> GroupsList<G> {
        let owner: Rc<dyn Any> = self.inner.clone();
        GroupsList {
            inner: Rc::clone(&self.inner.groups),
            _owner: owner,
        }
    }

    /// Group key of the element at `index`.
    pub fn group_key_at(&self, index: usize) -> Option<Key> {
        let key = self.inner.core.key_at(index)?;
        self.inner.membership.borrow().group_of.get(&key).cloned()
    }

    /// Index range occupied by `group`.
    pub fn group_range(&self, group: &Key) -> Option<Range<usize>> {
        let size = self.group_size(group);
        if size == 0 {
            return None;
        }
        let start = self.inner.group_start(group);
        Some(start..start + size)
    }

    /// Number of members in `group`.
    pub fn group_size(&self, group: &Key) -> usize {
        self.inner
            .membership
            .borrow()
            .sizes
            .get(group)
            .copied()
            .unwrap_or(0)
    }

    /// Stop following the upstream and clear both this list and `.groups`.
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        batch(|| {
            self.inner.core.dispose();
            self.inner.groups.core.dispose();
            self.inner.groups.heads.borrow_mut().clear();
            *self.inner.membership.borrow_mut() = Membership::default();
        });
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.is_disposed()
    }

    /// Regroup the whole upstream and emit Reset on both lists.
    pub fn reevaluate(&self) {
        if !self.is_disposed() {
            batch(|| self.inner.regroup());
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.core.observer_count()
    }
}

/// Lay out `items` from scratch.
fn partition<T: Clone, G: Clone>(
    items: Vec<(Key, T)>,
    group_key: &GroupKeyFn<T>,
    group_data: &GroupDataFn<T, G>,
    group_order: &GroupOrder,
) -> Layout<T, G> {
    let mut order: Vec<Key> = Vec::new();
    let mut members: HashMap<Key, Vec<(Key, T)>> = HashMap::new();
    for (key, value) in items {
        let group = group_key(&value);
        members
            .entry(group.clone())
            .or_insert_with(|| {
                order.push(group);
                Vec::new()
            })
            .push((key, value));
    }
    order.sort_by(|a, b| group_order(a, b));

    let mut elements = Vec::new();
    let mut groups = Vec::new();
    let mut heads = HashMap::new();
    let mut membership = Membership::default();
    for group in order {
        let Some(items) = members.remove(&group) else {
            continue;
        };
        let Some((first_key, first_value)) = items.first() else {
            continue;
        };
        groups.push((group.clone(), group_data(first_value)));
        heads.insert(group.clone(), first_key.clone());
        membership.sizes.insert(group.clone(), items.len());
        for (key, value) in items {
            membership.group_of.insert(key.clone(), group.clone());
            elements.push((key, value));
        }
    }

    Layout {
        elements: Slots::from_items(elements),
        groups: Slots::from_items(groups),
        heads,
        membership,
    }
}

impl<T: Clone + 'static, G: Clone + 'static> GroupedInner<T, G> {
    fn upstream(&self) -> Option<&Rc<dyn ObservableList<T>>> {
        self.core.upstream()
    }

    fn handle(&self, event: &ListEvent<T>) {
        if self.core.is_disposed() {
            return;
        }
        batch(|| {
            let mut pending = Pending::default();
            match event {
                ListEvent::Reset => return self.regroup(),
                ListEvent::LengthChanged { .. } => {}
                ListEvent::Inserted { key, .. } => self.admit(key, &mut pending),
                ListEvent::Removed { key, .. } => self.evict(key, &mut pending),
                ListEvent::Changed { key, .. } => self.regroup_member(key, &mut pending),
                ListEvent::Moved { key, .. } => self.reposition(key, &mut pending),
            }
            self.deliver(pending);
        });
    }

    fn deliver(&self, pending: Pending<T, G>) {
        self.core.emit_all(pending.elements);
        if pending.elements_resized {
            self.core.schedule_length();
        }
        self.groups.core.emit_all(pending.groups);
        if pending.groups_resized {
            self.groups.core.schedule_length();
        }
    }

    fn regroup(&self) {
        let Some(upstream) = self.upstream() else {
            return;
        };
        let layout = partition(
            upstream_items(&**upstream),
            &self.group_key,
            &self.group_data,
            &self.group_order,
        );
        debug!(
            list = %self.core.label(),
            size = layout.elements.len(),
            groups = layout.groups.len(),
            "regrouped"
        );
        *self.membership.borrow_mut() = layout.membership;
        *self.groups.heads.borrow_mut() = layout.heads;
        *self.core.slots().borrow_mut() = layout.elements;
        *self.groups.core.slots().borrow_mut() = layout.groups;

        self.core.emit(ListEvent::Reset);
        self.core.schedule_length();
        self.groups.core.emit(ListEvent::Reset);
        self.groups.core.schedule_length();
    }

    /// First index of `group`; for an unknown group, where it would start.
    fn group_start(&self, group: &Key) -> usize {
        let groups = self.groups.core.slots().borrow();
        let membership = self.membership.borrow();
        groups
            .keys()
            .iter()
            .take_while(|candidate| *candidate != group)
            .map(|candidate| membership.sizes.get(candidate).copied().unwrap_or(0))
            .sum()
    }

    fn size_of(&self, group: &Key) -> usize {
        self.membership.borrow().sizes.get(group).copied().unwrap_or(0)
    }

    /// Index for `key` among the `size` members of `group`, by upstream order.
    /// `key` must not be a slot.
    fn member_position(&self, key: &Key, group: &Key, size: usize) -> usize {
        let start = self.group_start(group);
        let Some(upstream) = self.upstream() else {
            return start;
        };
        let upstream_index = upstream.index_of_key(key);
        let slots = self.core.slots().borrow();
        let members = slots.keys().get(start..start + size).unwrap_or_default();
        start + members.partition_point(|member| upstream.index_of_key(member) < upstream_index)
    }

    fn admit(&self, key: &Key, pending: &mut Pending<T, G>) {
        let Some(value) = self.upstream().and_then(|upstream| upstream.get_by_key(key)) else {
            return;
        };
        if self.core.slots().borrow().contains(key) {
            return;
        }
        self.insert_member(key, value, pending);
    }

    fn insert_member(&self, key: &Key, value: T, pending: &mut Pending<T, G>) {
        let group = (self.group_key)(&value);
        let is_new = !self.membership.borrow().sizes.contains_key(&group);

        if is_new {
            let head = (self.group_data)(&value);
            let at = {
                let groups = self.groups.core.slots().borrow();
                groups
                    .keys()
                    .partition_point(|existing| (self.group_order)(existing, &group) != Ordering::Greater)
            };
            let index = self
                .groups
                .core
                .slots()
                .borrow_mut()
                .insert(at, group.clone(), head.clone());
            self.groups.heads.borrow_mut().insert(group.clone(), key.clone());
            self.membership.borrow_mut().sizes.insert(group.clone(), 0);
            pending.groups.push(ListEvent::Inserted {
                index,
                key: group.clone(),
                value: head,
            });
            pending.groups_resized = true;
        }

        let at = self.member_position(key, &group, self.size_of(&group));
        let index = self
            .core
            .slots()
            .borrow_mut()
            .insert(at, key.clone(), value.clone());
        {
            let mut membership = self.membership.borrow_mut();
            *membership.sizes.entry(group.clone()).or_insert(0) += 1;
            membership.group_of.insert(key.clone(), group.clone());
        }
        pending.elements.push(ListEvent::Inserted {
            index,
            key: key.clone(),
            value,
        });
        pending.elements_resized = true;

        if !is_new {
            self.refresh_head(&group, false, pending);
        }
    }

    fn evict(&self, key: &Key, pending: &mut Pending<T, G>) {
        let Some(group) = self.membership.borrow_mut().group_of.remove(key) else {
            return;
        };
        let removed = self.core.slots().borrow_mut().remove(key);
        let Some((index, value)) = removed else {
            return;
        };
        let remaining = {
            let mut membership = self.membership.borrow_mut();
            let size = membership.sizes.entry(group.clone()).or_insert(1);
            *size = size.saturating_sub(1);
            *size
        };
        pending.elements.push(ListEvent::Removed {
            index,
            key: key.clone(),
            value,
        });
        pending.elements_resized = true;

        if remaining > 0 {
            self.refresh_head(&group, false, pending);
            return;
        }

        self.membership.borrow_mut().sizes.remove(&group);
        self.groups.heads.borrow_mut().remove(&group);
        let removed_group = self.groups.core.slots().borrow_mut().remove(&group);
        if let Some((index, head)) = removed_group {
            pending.groups.push(ListEvent::Removed {
                index,
                key: group,
                value: head,
            });
            pending.groups_resized = true;
        }
    }

    fn regroup_member(&self, key: &Key, pending: &mut Pending<T, G>) {
        let Some(value) = self.upstream().and_then(|upstream| upstream.get_by_key(key)) else {
            return;
        };
        let group = (self.group_key)(&value);
        let current = self.membership.borrow().group_of.get(key).cloned();

        match current {
            None => self.insert_member(key, value, pending),
            Some(current) if current == group => {
                let changed = {
                    let mut slots = self.core.slots().borrow_mut();
                    let index = slots.position(key);
                    index.zip(slots.replace(key, value.clone()))
                };
                let Some((index, old_value)) = changed else {
                    return;
                };
                pending.elements.push(ListEvent::Changed {
                    index,
                    key: key.clone(),
                    old_value,
                    new_value: value,
                });
                if index == self.group_start(&group) {
                    self.refresh_head(&group, true, pending);
                }
            }
            Some(_) => {
                self.evict(key, pending);
                self.insert_member(key, value, pending);
            }
        }
    }

    fn reposition(&self, key: &Key, pending: &mut Pending<T, G>) {
        let Some(group) = self.membership.borrow().group_of.get(key).cloned() else {
            return;
        };
        let removed = self.core.slots().borrow_mut().remove(key);
        let Some((old_index, value)) = removed else {
            return;
        };
        let others = self.size_of(&group).saturating_sub(1);
        let at = self.member_position(key, &group, others);
        let new_index = self
            .core
            .slots()
            .borrow_mut()
            .insert(at, key.clone(), value.clone());
        if new_index != old_index {
            pending.elements.push(ListEvent::Moved {
                old_index,
                new_index,
                key: key.clone(),
                value,
            });
            self.refresh_head(&group, false, pending);
        }
    }

    /// Recompute `group`'s head if its first member changed, or always when
    /// `force` is set.
    fn refresh_head(&self, group: &Key, force: bool, pending: &mut Pending<T, G>) {
        let start = self.group_start(group);
        let first = {
            let slots = self.core.slots().borrow();
            slots
                .key_at(start)
                .and_then(|key| slots.get_by_key(key).map(|value| (key.clone(), value.clone())))
        };
        let Some((first_key, first_value)) = first else {
            return;
        };
        if !force && self.groups.heads.borrow().get(group) == Some(&first_key) {
            return;
        }

        let head = (self.group_data)(&first_value);
        self.groups.heads.borrow_mut().insert(group.clone(), first_key);
        let changed = {
            let mut groups = self.groups.core.slots().borrow_mut();
            let index = groups.position(group);
            index.zip(groups.replace(group, head.clone()))
        };
        if let Some((index, old_value)) = changed {
            pending.groups.push(ListEvent::Changed {
                index,
                key: group.clone(),
                old_value,
                new_value: head,
            });
        }
    }
}

impl<T: Clone + 'static, G: Clone + 'static> LengthAnnouncer for GroupedInner<T, G> {
    fn announce_length(&self) {
        self.core.announce_length();
    }
}

delegate_to_core!(GroupedList<T, G>);

impl<T, G> std::fmt::Debug for GroupedList<T, G>
where
    T: Clone + std::fmt::Debug + 'static,
    G: Clone + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupedList")
            .field("values", &self.inner.core.slots().borrow().to_vec())
            .field("groups", &self.groups())
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

    fn parity(n: &i32) -> &'static str {
        if n % 2 == 0 { "even" } else { "odd" }
    }

    fn key(k: &str) -> Key {
        Key::from(k)
    }

    fn record<V: Clone + 'static, L: ListExt<V>>(
        list: &L,
    ) -> (Rc<RefCell<Vec<ListEvent<V>>>>, crate::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = list.observe(
            None,
            Rc::new({
                let log = log.clone();
                move |event: &ListEvent<V>| log.borrow_mut().push(event.clone())
            }),
        );
        (log, sub)
    }

    #[test]
    fn groups_in_key_order_members_in_upstream_order() {
        let numbers = list(vec![1, 2, 3, 4]);
        let grouped = numbers.create_grouped(parity, parity);

        assert_eq!(grouped.to_vec(), vec![2, 4, 1, 3]);
        assert_eq!(grouped.groups().to_vec(), vec!["even", "odd"]);
        assert_eq!(grouped.groups().keys(), vec![key("even"), key("odd")]);
    }

    #[test]
    fn custom_group_order() {
        let numbers = list(vec![1, 2, 3, 4]);
        let grouped = numbers.create_grouped_by(parity, parity, |a, b| b.cmp(a));
        assert_eq!(grouped.to_vec(), vec![1, 3, 2, 4]);
        assert_eq!(grouped.groups().to_vec(), vec!["odd", "even"]);
    }

    #[test]
    fn helpers() {
        let numbers = list(vec![1, 2, 3, 4, 5]);
        let grouped = numbers.create_grouped(parity, |n| *n);

        assert_eq!(grouped.group_key_at(0), Some(key("even")));
        assert_eq!(grouped.group_key_at(2), Some(key("odd")));
        assert_eq!(grouped.group_key_at(9), None);
        assert_eq!(grouped.group_range(&key("even")), Some(0..2));
        assert_eq!(grouped.group_range(&key("odd")), Some(2..5));
        assert_eq!(grouped.group_range(&key("none")), None);
        assert_eq!(grouped.group_size(&key("odd")), 3);
        assert_eq!(grouped.groups().first_key(&key("odd")), numbers.key_at(0));
        assert_eq!(grouped.groups().to_vec(), vec![2, 1]);
    }

    #[test]
    fn insert_into_existing_and_new_group() {
        let numbers = list(vec![1, 3]);
        let grouped = numbers.create_grouped(parity, parity);
        let groups = grouped.groups();
        let (elements_log, _a) = record::<i32, _>(&grouped);
        let (groups_log, _b) = record::<&str, _>(&groups);

        numbers.push(5);
        assert_eq!(grouped.to_vec(), vec![1, 3, 5]);
        assert!(groups_log.borrow().is_empty());

        numbers.push(2);
        assert_eq!(grouped.to_vec(), vec![2, 1, 3, 5]);
        assert_eq!(groups.to_vec(), vec!["even", "odd"]);
        assert!(matches!(
            &elements_log.borrow()[2],
            ListEvent::Inserted { index: 0, value: 2, .. }
        ));
        assert_eq!(
            groups_log.borrow()[0],
            ListEvent::Inserted {
                index: 0,
                key: key("even"),
                value: "even"
            }
        );
        assert_eq!(groups_log.borrow()[1], ListEvent::LengthChanged { length: 2 });
    }

    #[test]
    fn emptied_group_disappears() {
        let numbers = list(vec![1, 2, 3]);
        let grouped = numbers.create_grouped(parity, parity);
        let groups = grouped.groups();
        let (groups_log, _sub) = record::<&str, _>(&groups);

        numbers.remove_at(1);

        assert_eq!(grouped.to_vec(), vec![1, 3]);
        assert_eq!(groups.to_vec(), vec!["odd"]);
        assert_eq!(
            *groups_log.borrow(),
            vec![
                ListEvent::Removed {
                    index: 0,
                    key: key("even"),
                    value: "even"
                },
                ListEvent::LengthChanged { length: 1 },
            ]
        );
        assert_eq!(grouped.group_size(&key("even")), 0);
    }

    #[test]
    fn group_change_is_removed_then_inserted() {
        let numbers = list(vec![1, 2, 3]);
        let grouped = numbers.create_grouped(parity, parity);
        let (log, _sub) = record::<i32, _>(&grouped);

        numbers.set_at(0, 4);

        assert_eq!(grouped.to_vec(), vec![4, 2, 3]);
        let kinds: Vec<EventKind> = log.borrow().iter().map(ListEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::ItemRemoved, EventKind::ItemInserted]);
        assert!(matches!(&log.borrow()[0], ListEvent::Removed { index: 1, value: 1, .. }));
        assert!(matches!(&log.borrow()[1], ListEvent::Inserted { index: 0, value: 4, .. }));
    }

    #[test]
    fn head_change_is_reported_on_groups() {
        let numbers = list(vec![3, 5]);
        let grouped = numbers.create_grouped(parity, |n| *n);
        let groups = grouped.groups();
        let (log, _sub) = record::<i32, _>(&groups);

        numbers.unshift(vec![1]);
        assert_eq!(groups.to_vec(), vec![1]);

        numbers.shift();
        assert_eq!(groups.to_vec(), vec![3]);

        numbers.set_at(0, 7);
        assert_eq!(groups.to_vec(), vec![7]);

        let changes: Vec<(i32, i32)> = log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ListEvent::Changed {
                    old_value,
                    new_value,
                    ..
                } => Some((*old_value, *new_value)),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![(3, 1), (1, 3), (3, 7)]);
    }

    #[test]
    fn element_records_precede_group_records() {
        let numbers = list(vec![1]);
        let grouped = numbers.create_grouped(parity, parity);
        let groups = grouped.groups();
        let order = Rc::new(RefCell::new(Vec::new()));

        let _a = grouped.on(EventKind::ItemInserted, {
            let order = order.clone();
            let groups = groups.clone();
            move |_| order.borrow_mut().push(("element", groups.len()))
        });
        let _b = groups.on(EventKind::ItemInserted, {
            let order = order.clone();
            move |_| order.borrow_mut().push(("group", 0))
        });

        numbers.push(2);

        // Both sides are already updated when the element record arrives
        assert_eq!(*order.borrow(), vec![("element", 2), ("group", 0)]);
    }

    #[test]
    fn upstream_move_within_group() {
        let numbers = list(vec![1, 2, 3]);
        let grouped = numbers.create_grouped(parity, |n| *n);
        let groups = grouped.groups();

        numbers.move_item(2, 0);

        assert_eq!(numbers.to_vec(), vec![3, 1, 2]);
        assert_eq!(grouped.to_vec(), vec![2, 3, 1]);
        assert_eq!(groups.to_vec(), vec![2, 3]);
    }

    #[test]
    fn groups_list_is_read_only() {
        let numbers = list(vec![1, 2]);
        let grouped = numbers.create_grouped(parity, parity);
        let groups = grouped.groups();

        assert!(groups.splice(0, 1, vec!["x"]).is_empty());
        assert_eq!(groups.set_at(0, "x"), None);
        groups.push("x");
        groups.move_item(0, 1);

        assert_eq!(groups.to_vec(), vec!["even", "odd"]);
        assert_eq!(numbers.to_vec(), vec![1, 2]);
    }

    #[test]
    fn groups_outlive_grouped_handle() {
        let numbers = list(vec![1]);
        let groups = numbers.create_grouped(parity, parity).groups();

        numbers.push(2);

        assert_eq!(groups.to_vec(), vec!["even", "odd"]);
    }

    #[test]
    fn groups_of_groups() {
        let words = list(vec!["apple", "avocado", "banana", "blueberry", "cherry"]);
        let by_letter = words.create_grouped(|w| w[..1].to_string(), |w| w.len());
        let letters = by_letter.groups();
        assert_eq!(letters.to_vec(), vec![5, 6, 6]);

        let by_length = letters.create_grouped(|n| n.to_string(), |n| *n);
        assert_eq!(by_length.to_vec(), vec![5, 6, 6]);
        assert_eq!(by_length.groups().to_vec(), vec![5, 6]);

        words.unshift(vec!["blackberry"]);
        assert_eq!(letters.to_vec(), vec![5, 10, 6]);
        assert_eq!(by_length.groups().keys(), vec![key("10"), key("5"), key("6")]);
    }

    #[test]
    fn filtered_of_grouped() {
        let numbers = list(vec![1, 2, 3, 4]);
        let grouped = numbers.create_grouped(parity, parity);
        let big = grouped.create_filtered(|n| *n > 1);
        assert_eq!(big.to_vec(), vec![2, 4, 3]);

        numbers.set_at(0, 6);
        assert_eq!(big.to_vec(), vec![6, 2, 4, 3]);
    }

    #[test]
    fn dispose_clears_both_sides() {
        let numbers = list(vec![1, 2]);
        let grouped = numbers.create_grouped(parity, parity);
        let groups = grouped.groups();

        grouped.dispose();
        numbers.push(3);

        assert!(grouped.is_empty());
        assert!(groups.is_empty());
        assert!(groups.is_disposed());
        assert_eq!(numbers.observer_count(), 0);
    }
}
