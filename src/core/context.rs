// ============================================================================
// spark-lists - Mutation Context
// Thread-local state tracking the current mutator call
// ============================================================================
//
// A mutator call may fan out through any number of projections. Structural
// records are delivered immediately, but each list's LengthChanged record is
// deferred until the outermost mutation (or batch) finishes, so every list
// announces its net length once, after all of its structural records.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Weak;

// =============================================================================
// LENGTH ANNOUNCER
// =============================================================================

/// A list that may owe its observers a LengthChanged record.
pub trait LengthAnnouncer {
    /// Emit LengthChanged if the length differs from the last announced one.
    fn announce_length(&self);
}

// =============================================================================
// MUTATION CONTEXT
// =============================================================================

/// Thread-local bookkeeping for in-flight mutations.
pub struct MutationContext {
    /// Nesting depth of mutator calls and explicit batches
    depth: Cell<u32>,

    /// Whether pending announcements are being flushed right now
    flushing: Cell<bool>,

    /// Lists that changed length during the current mutation
    pending: RefCell<Vec<Weak<dyn LengthAnnouncer>>>,
}

impl MutationContext {
    pub fn new() -> Self {
        Self {
            depth: Cell::new(0),
            flushing: Cell::new(false),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Increment depth, returns new depth
    pub fn enter(&self) -> u32 {
        let depth = self.depth.get() + 1;
        self.depth.set(depth);
        depth
    }

    /// Decrement depth, returns new depth
    pub fn exit(&self) -> u32 {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        depth
    }

    pub fn is_mutating(&self) -> bool {
        self.depth.get() > 0
    }

    pub fn set_flushing(&self, value: bool) -> bool {
        self.flushing.replace(value)
    }

    pub fn add_pending(&self, list: Weak<dyn LengthAnnouncer>) {
        self.pending.borrow_mut().push(list);
    }

    /// Take every pending announcer, in scheduling order.
    pub fn take_pending(&self) -> Vec<Weak<dyn LengthAnnouncer>> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

impl Default for MutationContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    /// The thread-local mutation context
    static CONTEXT: MutationContext = MutationContext::new();
}

/// Access the thread-local mutation context.
pub fn with_context<R>(f: impl FnOnce(&MutationContext) -> R) -> R {
    CONTEXT.with(f)
}

// =============================================================================
// TESTS
// =============================================================================
