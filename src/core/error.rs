// ============================================================================
// spark-lists - Errors
// ============================================================================
//
// Only argument errors surface as `Err`. Lookups that miss return `None`,
// and writes to a disposed projection are silent no-ops.
// ============================================================================

use thiserror::Error;

/// Errors raised by list operations. A call that fails has no effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListError {
    /// A length assignment that is not a non-negative whole number.
    #[error("invalid list length {value}: must be a finite, non-negative whole number")]
    InvalidLength { value: f64 },

    /// Initial values contained a hole.
    #[error("initial values contain a hole at index {index}")]
    Hole { index: usize },

    /// The list cannot be written to directly.
    #[error("list is read-only")]
    ReadOnly,
}

impl ListError {
    /// Whether this is an invalid-argument failure.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ListError::InvalidLength { .. } | ListError::Hole { .. })
    }
}
