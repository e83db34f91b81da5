// Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use spark_lists::{EventKind, ListEvent, ListExt, Subscription};
use tracing_subscriber::EnvFilter;

/// Route library tracing to the test harness. `RUST_LOG=spark_lists=trace`
/// shows every dispatch.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Every record delivered to one list, in order.
pub struct Recorder<T> {
    log: Rc<RefCell<Vec<ListEvent<T>>>>,
    _subscription: Subscription,
}

impl<T: Clone + 'static> Recorder<T> {
    pub fn attach<L: ListExt<T>>(list: &L) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let subscription = list.subscribe({
            let log = log.clone();
            move |event| log.borrow_mut().push(event.clone())
        });
        Self {
            log,
            _subscription: subscription,
        }
    }

    pub fn events(&self) -> Vec<ListEvent<T>> {
        self.log.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.log.borrow().iter().map(ListEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.log.borrow().iter().filter(|event| event.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}
