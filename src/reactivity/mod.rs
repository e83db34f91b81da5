// ============================================================================
// spark-lists - Reactivity Module
// Observer registration, synchronous dispatch, batching and record replay
// ============================================================================

pub mod batching;
pub mod mirror;
pub mod notifier;

pub use batching::{batch, flush_pending_lengths, is_batching, LengthAnnouncement};
pub use mirror::{replay, Replay};
pub use notifier::{Notifier, Observer, Subscription};
