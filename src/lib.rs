// ============================================================================
// spark-lists - Observable Keyed Lists with Live Projections
// ============================================================================
//
// A `KeyedList` is an ordered sequence whose slots carry stable keys. Every
// mutation is reported synchronously as fine-grained change records. Filtered,
// sorted and grouped projections subscribe to a list (or to each other) and
// stay consistent with it incrementally.
//
// Everything is single-threaded: handles are `Rc`-based and `!Send`.
// ============================================================================

pub mod collections;
pub mod core;
pub mod projections;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::error::ListError;
pub use core::event::{EventKind, Item, ListEvent};
pub use core::key::{Key, KeyGenerator};
pub use core::options::ListOptions;

// Re-export the list types and constructors
pub use collections::list::{list, list_with_options, KeyedList};
pub use collections::source::{ListExt, ObservableList};
pub use projections::{FilteredList, GroupedList, GroupsList, SortedList};

// Re-export reactivity functions
pub use reactivity::batching::{batch, is_batching};
pub use reactivity::notifier::{Observer, Subscription};

/// Everything needed to build and observe lists.
pub mod prelude {
    pub use crate::{
        batch, list, list_with_options, EventKind, FilteredList, GroupedList, GroupsList, Item,
        Key, KeyedList, ListError, ListEvent, ListExt, ListOptions, ObservableList, SortedList,
        Subscription,
    };
}

// =============================================================================
// TESTS
// =============================================================================
