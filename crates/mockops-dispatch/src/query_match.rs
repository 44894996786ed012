//! Rule-based selection
//!
//! Ordered regex rules over parts of the request; the first rule that
//! matches names the response.

use crate::config::{MatchRule, MatchSource};
use crate::error::ConfigError;
use crate::request::MockRequest;
use crate::response::ResponseDefinition;
use crate::store::ResponseStore;
use crate::strategy::{DispatchStyle, SelectionStrategy};
use regex::Regex;
use std::sync::Arc;

#[derive(Debug)]
struct CompiledRule {
    source: MatchSource,
    header: Option<String>,
    pattern: Regex,
    response: String,
}

impl CompiledRule {
    fn subject<'r>(&self, request: &'r MockRequest) -> Option<&'r str> {
        match self.source {
            MatchSource::Body => Some(&request.body),
            MatchSource::Path => Some(&request.path),
            MatchSource::Method => Some(&request.method),
            MatchSource::Header => self.header.as_deref().and_then(|h| request.header(h)),
        }
    }
}

/// First-match regex dispatch
#[derive(Debug)]
pub struct QueryMatchStrategy {
    rules: Vec<CompiledRule>,
}

impl QueryMatchStrategy {
    /// Compile rules
    ///
    /// # Errors
    /// `ConfigError::InvalidPattern` if a pattern does not compile
    pub fn new(rules: &[MatchRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern =
                    Regex::new(&rule.pattern).map_err(|source| ConfigError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })?;
                Ok(CompiledRule {
                    source: rule.source,
                    header: rule.header.clone(),
                    pattern,
                    response: rule.response.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl SelectionStrategy for QueryMatchStrategy {
    fn select(
        &self,
        request: &MockRequest,
        store: &ResponseStore,
    ) -> Option<Arc<ResponseDefinition>> {
        for rule in &self.rules {
            let Some(subject) = rule.subject(request) else {
                continue;
            };
            if !rule.pattern.is_match(subject) {
                continue;
            }
            match store.by_name(&rule.response) {
                Some(response) => return Some(response),
                None => {
                    tracing::warn!(
                        "match rule [{}] names missing response [{}]",
                        rule.pattern,
                        rule.response
                    );
                }
            }
        }
        None
    }

    fn style(&self) -> DispatchStyle {
        DispatchStyle::QueryMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ResponseStore {
        let mut store = ResponseStore::new();
        for name in ["fault", "ok"] {
            store.add(ResponseDefinition::new(name, "")).unwrap();
        }
        store
    }

    #[test]
    fn first_matching_rule_wins() {
        let strategy = QueryMatchStrategy::new(&[
            MatchRule::body("<id>0</id>", "fault"),
            MatchRule::body("<id>", "ok"),
        ])
        .unwrap();

        let zero = MockRequest::new("<id>0</id>");
        let other = MockRequest::new("<id>7</id>");
        assert_eq!(strategy.select(&zero, &store()).unwrap().name, "fault");
        assert_eq!(strategy.select(&other, &store()).unwrap().name, "ok");
    }

    #[test]
    fn header_rule_uses_named_header() {
        let strategy =
            QueryMatchStrategy::new(&[MatchRule::header("SOAPAction", "Fail$", "fault")]).unwrap();

        let hit = MockRequest::new("").with_header("soapaction", "urn:Fail");
        let miss = MockRequest::new("");
        assert_eq!(strategy.select(&hit, &store()).unwrap().name, "fault");
        assert!(strategy.select(&miss, &store()).is_none());
    }

    #[test]
    fn rule_naming_missing_response_is_skipped() {
        let strategy = QueryMatchStrategy::new(&[
            MatchRule::body(".*", "gone"),
            MatchRule::body(".*", "ok"),
        ])
        .unwrap();
        assert_eq!(
            strategy.select(&MockRequest::new("x"), &store()).unwrap().name,
            "ok"
        );
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = QueryMatchStrategy::new(&[MatchRule::body("(", "ok")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
