// ============================================================================
// spark-lists - Change Records
// The notifications a list delivers to its observers
// ============================================================================

use super::key::Key;

// =============================================================================
// ITEM
// =============================================================================

/// A slot as seen by callers: its key plus a copy of its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<T> {
    pub key: Key,
    pub data: T,
}

impl<T> Item<T> {
    pub fn new(key: Key, data: T) -> Self {
        Self { key, data }
    }
}

// =============================================================================
// EVENT KIND
// =============================================================================

/// Names each kind of record, for per-kind subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Reload,
    ItemInserted,
    ItemRemoved,
    ItemChanged,
    ItemMoved,
    LengthChanged,
}

impl EventKind {
    /// The conventional event name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Reload => "reload",
            EventKind::ItemInserted => "iteminserted",
            EventKind::ItemRemoved => "itemremoved",
            EventKind::ItemChanged => "itemchanged",
            EventKind::ItemMoved => "itemmoved",
            EventKind::LengthChanged => "lengthchanged",
        }
    }
}

// =============================================================================
// LIST EVENT
// =============================================================================

/// One change record.
///
/// Indices refer to the list state at the moment the record is delivered:
/// composite mutations apply one slot at a time and deliver each record
/// before touching the next slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent<T> {
    /// Contents were replaced wholesale; observers must re-read everything.
    Reset,
    Inserted {
        index: usize,
        key: Key,
        value: T,
    },
    Removed {
        index: usize,
        key: Key,
        value: T,
    },
    /// The slot kept its key and position but its value was replaced (or
    /// mutated in place, in which case both values are the current one).
    Changed {
        index: usize,
        key: Key,
        old_value: T,
        new_value: T,
    },
    Moved {
        old_index: usize,
        new_index: usize,
        key: Key,
        value: T,
    },
    /// Delivered after the structural records of a mutator call whenever the
    /// call changed the length.
    LengthChanged {
        length: usize,
    },
}

impl<T> ListEvent<T> {
    pub fn kind(&self) -> EventKind {
        match self {
            ListEvent::Reset => EventKind::Reload,
            ListEvent::Inserted { .. } => EventKind::ItemInserted,
            ListEvent::Removed { .. } => EventKind::ItemRemoved,
            ListEvent::Changed { .. } => EventKind::ItemChanged,
            ListEvent::Moved { .. } => EventKind::ItemMoved,
            ListEvent::LengthChanged { .. } => EventKind::LengthChanged,
        }
    }

    /// The key of the slot this record is about, if any.
    pub fn key(&self) -> Option<&Key> {
        match self {
            ListEvent::Inserted { key, .. }
            | ListEvent::Removed { key, .. }
            | ListEvent::Changed { key, .. }
            | ListEvent::Moved { key, .. } => Some(key),
            ListEvent::Reset | ListEvent::LengthChanged { .. } => None,
        }
    }

    /// Whether this is a structural record (anything but LengthChanged).
    pub fn is_structural(&self) -> bool {
        !matches!(self, ListEvent::LengthChanged { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
