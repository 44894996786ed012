//! Strategy registry
//!
//! Provides [`StrategyRegistry`], which turns a [`DispatchConfig`] into a
//! live [`SelectionStrategy`].

use crate::config::DispatchConfig;
use crate::error::ConfigError;
use crate::query_match::QueryMatchStrategy;
use crate::random::RandomStrategy;
use crate::scripted::ScriptStrategy;
use crate::sequence::SequenceStrategy;
use crate::strategy::{DefaultOnlyStrategy, DispatchStyle, SelectionStrategy};
use mockops_script::{ScriptEngineRegistry, ScriptError};
use std::sync::Arc;

/// Builds selection strategies for mock operations
#[derive(Debug, Default, Clone)]
pub struct StrategyRegistry {
    engines: ScriptEngineRegistry,
}

impl StrategyRegistry {
    /// Create registry without script engines
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry backed by script engines
    #[inline]
    #[must_use]
    pub fn with_engines(engines: ScriptEngineRegistry) -> Self {
        Self { engines }
    }

    /// Script engines available to `script` dispatch
    #[inline]
    #[must_use]
    pub fn engines(&self) -> &ScriptEngineRegistry {
        &self.engines
    }

    /// Check if a style can be built
    ///
    /// `script` needs at least one registered engine.
    #[must_use]
    pub fn supports(&self, style: DispatchStyle) -> bool {
        match style {
            DispatchStyle::Script => !self.engines.languages().is_empty(),
            _ => true,
        }
    }

    /// Styles that can be built
    #[must_use]
    pub fn styles(&self) -> Vec<DispatchStyle> {
        DispatchStyle::ALL
            .into_iter()
            .filter(|s| self.supports(*s))
            .collect()
    }

    /// Build the strategy described by `config`
    ///
    /// # Arguments
    /// * `config` - Dispatch configuration
    /// * `owner` - Mock operation name, used as the script log owner
    ///
    /// # Errors
    /// - `ConfigError::InvalidPattern` for a rule that does not compile
    /// - `ConfigError::Script` for a missing script or unknown language
    pub fn build(
        &self,
        config: &DispatchConfig,
        owner: &str,
    ) -> Result<Arc<dyn SelectionStrategy>, ConfigError> {
        let strategy: Arc<dyn SelectionStrategy> = match config.style {
            DispatchStyle::Sequence => Arc::new(SequenceStrategy::new()),
            DispatchStyle::Random => Arc::new(RandomStrategy),
            DispatchStyle::DefaultOnly => Arc::new(DefaultOnlyStrategy),
            DispatchStyle::QueryMatch => Arc::new(QueryMatchStrategy::new(&config.rules)?),
            DispatchStyle::Script => {
                let script = config
                    .script
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| ScriptError::Compile("no dispatch script configured".into()))?;
                let executor = match &config.language {
                    Some(language) => self.engines.create(language)?,
                    None => self.engines.create_default()?,
                };
                Arc::new(ScriptStrategy::new(owner, script, executor))
            }
        };
        tracing::debug!("built {} strategy for [{}]", config.style, owner);
        Ok(strategy)
    }
}
