// ============================================================================
// spark-lists - Batching
// Defer LengthChanged records to the end of the outermost mutation
// ============================================================================

use std::cell::Cell;
use std::rc::Weak;

use crate::core::context::{with_context, LengthAnnouncer};

// =============================================================================
// BATCH
// =============================================================================

/// Run `f` as one mutation.
///
/// Every mutator call is already its own batch. Wrapping several calls in
/// `batch` makes each affected list announce its length once, after all of
/// the structural records produced inside `f`.
///
/// # Example
///
/// ```
/// use spark_lists::{batch, list, EventKind, ListExt, ObservableList};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let numbers = list(vec![1, 2, 3]);
/// let announcements = Rc::new(Cell::new(0));
/// let _sub = numbers.on(EventKind::LengthChanged, {
///     let announcements = announcements.clone();
///     move |_| announcements.set(announcements.get() + 1)
/// });
///
/// batch(|| {
///     numbers.push(4);
///     numbers.push(5);
/// });
///
/// assert_eq!(announcements.get(), 1);
/// assert_eq!(numbers.len(), 5);
/// ```
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    with_context(|ctx| ctx.enter());

    // Exit the batch even if `f` panics
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let depth = with_context(|ctx| ctx.exit());

            // When outermost batch completes, flush pending announcements
            if depth == 0 {
                flush_pending_lengths();
            }
        }
    }

    let _guard = BatchGuard;
    f()
}

/// Check if a mutation or batch is in progress.
pub fn is_batching() -> bool {
    with_context(|ctx| ctx.is_mutating())
}

// =============================================================================
// PENDING LENGTH ANNOUNCEMENTS
// =============================================================================

/// Queue `list` to announce its length when the outermost mutation ends.
///
/// Outside any mutation the queue is flushed immediately.
pub fn schedule_length_announcement(list: Weak<dyn LengthAnnouncer>) {
    let flush_now = with_context(|ctx| {
        ctx.add_pending(list);
        !ctx.is_mutating()
    });

    if flush_now {
        flush_pending_lengths();
    }
}

/// Announce every pending length change.
///
/// Announcements can trigger observers that mutate again; anything they
/// schedule is picked up by the same loop.
pub fn flush_pending_lengths() {
    if with_context(|ctx| ctx.set_flushing(true)) {
        return;
    }

    struct FlushGuard;

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_flushing(false));
        }
    }

    let _guard = FlushGuard;
    loop {
        let pending = with_context(|ctx| ctx.take_pending());
        if pending.is_empty() {
            break;
        }
        for list in pending {
            if let Some(list) = list.upgrade() {
                list.announce_length();
            }
        }
    }
}

// =============================================================================
// LENGTH ANNOUNCEMENT
// =============================================================================

/// Per-list record of the last announced length.
#[derive(Debug)]
pub struct LengthAnnouncement {
    announced: Cell<usize>,
    scheduled: Cell<bool>,
}

impl LengthAnnouncement {
    pub fn new(length: usize) -> Self {
        Self {
            announced: Cell::new(length),
            scheduled: Cell::new(false),
        }
    }

    /// Schedule `owner` once per mutation.
    pub fn schedule(&self, owner: Weak<dyn LengthAnnouncer>) {
        if !self.scheduled.replace(true) {
            schedule_length_announcement(owner);
        }
    }

    /// Consume the schedule; returns the length to announce, if it changed.
    pub fn take_change(&self, current: usize) -> Option<usize> {
        self.scheduled.set(false);
        if self.announced.replace(current) == current {
            None
        } else {
            Some(current)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
