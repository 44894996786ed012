//! Random selection

use crate::request::MockRequest;
use crate::response::ResponseDefinition;
use crate::store::ResponseStore;
use crate::strategy::{DispatchStyle, SelectionStrategy};
use rand::Rng;
use std::sync::Arc;

/// Picks a uniformly random response
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomStrategy;

impl SelectionStrategy for RandomStrategy {
    fn select(
        &self,
        _request: &MockRequest,
        store: &ResponseStore,
    ) -> Option<Arc<ResponseDefinition>> {
        if store.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..store.len());
        store.get(index)
    }

    fn style(&self) -> DispatchStyle {
        DispatchStyle::Random
    }
}
