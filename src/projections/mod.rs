// ============================================================================
// spark-lists - Projections
// Live filtered, sorted and grouped views over any observable list
// ============================================================================
//
// A projection subscribes to its upstream, keeps its own slots in sync with
// every change record it receives, and re-publishes the net effect as its own
// change records. Projections are themselves observable lists, so they chain.
// Writes made through a projection are forwarded to its upstream.
// ============================================================================

mod core;
mod filtered;
mod grouped;
mod sorted;

pub use filtered::FilteredList;
pub use grouped::{GroupedList, GroupsList};
pub use sorted::SortedList;
