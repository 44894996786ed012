//! Selection strategy trait
//!
//! Provides the [`SelectionStrategy`] trait for pluggable response
//! selection. A strategy may decline to choose; the dispatcher then falls
//! back to the store's default.

use crate::request::MockRequest;
use crate::response::ResponseDefinition;
use crate::store::ResponseStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Picks a candidate response for a request
pub trait SelectionStrategy: Send + Sync + std::fmt::Debug {
    /// Choose a response from `store`, or `None` to defer to the default
    fn select(&self, request: &MockRequest, store: &ResponseStore)
        -> Option<Arc<ResponseDefinition>>;

    /// Style this strategy implements
    fn style(&self) -> DispatchStyle;

    /// Release resources held by the strategy
    fn release(&self) {}
}

/// Dispatch styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStyle {
    /// Cycle through responses in order
    #[default]
    Sequence,

    /// Uniformly random response
    Random,

    /// First matching regex rule names the response
    QueryMatch,

    /// Script returns the response name
    Script,

    /// Always use the default response
    DefaultOnly,
}

impl DispatchStyle {
    /// Every style, in declaration order
    pub const ALL: [Self; 5] = [
        Self::Sequence,
        Self::Random,
        Self::QueryMatch,
        Self::Script,
        Self::DefaultOnly,
    ];

    /// Stable name (matches the serialized form)
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Random => "random",
            Self::QueryMatch => "query_match",
            Self::Script => "script",
            Self::DefaultOnly => "default_only",
        }
    }
}

impl std::fmt::Display for DispatchStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Never chooses; every dispatch uses the default response
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOnlyStrategy;

impl SelectionStrategy for DefaultOnlyStrategy {
    fn select(
        &self,
        _request: &MockRequest,
        _store: &ResponseStore,
    ) -> Option<Arc<ResponseDefinition>> {
        None
    }

    fn style(&self) -> DispatchStyle {
        DispatchStyle::DefaultOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_only_declines() {
        let mut store = ResponseStore::new();
        store.add(ResponseDefinition::new("A", "")).unwrap();
        assert!(DefaultOnlyStrategy
            .select(&MockRequest::new(""), &store)
            .is_none());
    }

    #[test]
    fn style_names_match_serde() {
        for style in DispatchStyle::ALL {
            let json = serde_json::to_string(&style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.name()));
        }
    }
}
