// ============================================================================
// spark-lists - Collections
// The base keyed list and the list interface every derived view shares
// ============================================================================
//
// `ObservableList` is the read/observe/write contract. `KeyedList` is the one
// list that owns its contents and mints keys; every projection is an
// `ObservableList` too, fed by an upstream `ObservableList`.
// ============================================================================

pub mod list;
pub mod source;

pub use list::{list, list_with_options, KeyedList};
pub use source::{relative_index, ListExt, ObservableList};
