// ============================================================================
// spark-lists - Backing Vec Mirror
// Replays change records onto a caller-owned Vec (proxy mode)
// ============================================================================
//
// The mirror is just another observer: list code never knows whether a
// backing vec exists. Records whose indices do not fit the mirror (or a
// Reset) ask the caller for a full resync instead.
// ============================================================================

use crate::core::event::ListEvent;

/// Outcome of replaying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    Applied,
    /// The mirror can no longer be patched and must be replaced with a
    /// snapshot of the list.
    NeedsResync,
}

/// Apply one record to `target`.
pub fn replay<T: Clone>(target: &mut Vec<T>, event: &ListEvent<T>) -> Replay {
    match event {
        ListEvent::Reset => Replay::NeedsResync,
        ListEvent::Inserted { index, value, .. } => {
            if *index > target.len() {
                return Replay::NeedsResync;
            }
            target.insert(*index, value.clone());
            Replay::Applied
        }
        ListEvent::Removed { index, .. } => {
            if *index >= target.len() {
                return Replay::NeedsResync;
            }
            target.remove(*index);
            Replay::Applied
        }
        ListEvent::Changed {
            index, new_value, ..
        } => match target.get_mut(*index) {
            Some(slot) => {
                *slot = new_value.clone();
                Replay::Applied
            }
            None => Replay::NeedsResync,
        },
        ListEvent::Moved {
            old_index,
            new_index,
            ..
        } => {
            if *old_index >= target.len() || *new_index >= target.len() {
                return Replay::NeedsResync;
            }
            let value = target.remove(*old_index);
            target.insert(*new_index, value);
            Replay::Applied
        }
        ListEvent::LengthChanged { length } => {
            if *length == target.len() {
                Replay::Applied
            } else {
                Replay::NeedsResync
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
