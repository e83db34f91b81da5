// ============================================================================
// spark-lists - List Options
// Construction-time configuration for a KeyedList
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

/// Options for creating a list.
pub struct ListOptions<T> {
    /// A caller-owned vec that mirrors the list. Its contents at construction
    /// time seed the list (any values passed alongside are ignored), and every
    /// change record is replayed onto it afterwards.
    pub proxy: Option<Rc<RefCell<Vec<T>>>>,

    /// Name attached to this list's tracing events.
    pub label: Option<String>,
}

impl<T> Default for ListOptions<T> {
    fn default() -> Self {
        Self {
            proxy: None,
            label: None,
        }
    }
}

impl<T> ListOptions<T> {
    /// Options that mirror the list into `backing`.
    pub fn proxy(backing: Rc<RefCell<Vec<T>>>) -> Self {
        Self {
            proxy: Some(backing),
            label: None,
        }
    }

    /// Attach a label for tracing.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
