// ============================================================================
// spark-lists - Core Module
// Keys, change records, errors, options and the mutation context
// ============================================================================

pub mod context;
pub mod error;
pub mod event;
pub mod key;
pub mod options;

pub use context::{with_context, LengthAnnouncer, MutationContext};
pub use error::ListError;
pub use event::{EventKind, Item, ListEvent};
pub use key::{Key, KeyGenerator};
pub use options::ListOptions;
