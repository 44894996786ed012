//! Round-robin selection

use crate::request::MockRequest;
use crate::response::ResponseDefinition;
use crate::store::ResponseStore;
use crate::strategy::{DispatchStyle, SelectionStrategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cycles through the store in order, one step per dispatch
#[derive(Debug, Default)]
pub struct SequenceStrategy {
    next: AtomicUsize,
}

impl SequenceStrategy {
    /// Create strategy starting at the first response
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for SequenceStrategy {
    fn select(
        &self,
        _request: &MockRequest,
        store: &ResponseStore,
    ) -> Option<Arc<ResponseDefinition>> {
        if store.is_empty() {
            return None;
        }
        let step = self.next.fetch_add(1, Ordering::Relaxed);
        store.get(step % store.len())
    }

    fn style(&self) -> DispatchStyle {
        DispatchStyle::Sequence
    }

    fn release(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}
