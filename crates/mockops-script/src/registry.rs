//! Script engine registry
//!
//! Provides [`ScriptEngineRegistry`] for creating executors by language id.

use crate::executor::{ScriptError, ScriptExecutor};
use std::collections::HashMap;
use std::sync::Arc;

/// Creates fresh executors for one language
pub trait ScriptEngineFactory: Send + Sync {
    /// Language id (e.g. `"groovy"`, `"js"`)
    fn language(&self) -> &str;

    /// New executor with an empty environment
    fn create(&self) -> Box<dyn ScriptExecutor>;
}

struct FnFactory<F> {
    language: String,
    make: F,
}

impl<F> ScriptEngineFactory for FnFactory<F>
where
    F: Fn() -> Box<dyn ScriptExecutor> + Send + Sync,
{
    fn language(&self) -> &str {
        &self.language
    }

    fn create(&self) -> Box<dyn ScriptExecutor> {
        (self.make)()
    }
}

/// Registry of script engine factories
#[derive(Clone, Default)]
pub struct ScriptEngineRegistry {
    factories: HashMap<String, Arc<dyn ScriptEngineFactory>>,
    default_language: Option<String>,
}

impl ScriptEngineRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory
    ///
    /// The first registered language becomes the default.
    pub fn register(&mut self, factory: Arc<dyn ScriptEngineFactory>) {
        let language = factory.language().to_string();
        if self.default_language.is_none() {
            self.default_language = Some(language.clone());
        }
        tracing::debug!("registered script engine [{}]", language);
        self.factories.insert(language, factory);
    }

    /// Register a closure as a factory
    pub fn register_fn<F>(&mut self, language: impl Into<String>, make: F)
    where
        F: Fn() -> Box<dyn ScriptExecutor> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnFactory {
            language: language.into(),
            make,
        }));
    }

    /// Override the default language
    #[inline]
    #[must_use]
    pub fn with_default(mut self, language: impl Into<String>) -> Self {
        self.default_language = Some(language.into());
        self
    }

    /// Create executor for a language
    ///
    /// # Errors
    /// `ScriptError::UnsupportedLanguage` if nothing is registered for it
    pub fn create(&self, language: &str) -> Result<Box<dyn ScriptExecutor>, ScriptError> {
        self.factories
            .get(language)
            .map(|f| f.create())
            .ok_or_else(|| ScriptError::UnsupportedLanguage(language.to_string()))
    }

    /// Create executor for the default language
    ///
    /// # Errors
    /// `ScriptError::UnsupportedLanguage` if the registry is empty
    pub fn create_default(&self) -> Result<Box<dyn ScriptExecutor>, ScriptError> {
        match &self.default_language {
            Some(language) => self.create(language),
            None => Err(ScriptError::UnsupportedLanguage("<default>".to_string())),
        }
    }

    /// Check if a language is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, language: &str) -> bool {
        self.factories.contains_key(language)
    }

    /// Registered language ids
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ScriptEngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEngineRegistry")
            .field("languages", &self.languages())
            .field("default_language", &self.default_language)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MockScriptExecutor;

    fn quiet_executor() -> Box<dyn ScriptExecutor> {
        let mut exec = MockScriptExecutor::new();
        exec.expect_run().returning(|| Ok(serde_json::Value::Null));
        Box::new(exec)
    }

    #[test]
    fn empty_registry_has_no_default() {
        let registry = ScriptEngineRegistry::new();
        assert!(matches!(
            registry.create_default(),
            Err(ScriptError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn first_registered_is_default() {
        let mut registry = ScriptEngineRegistry::new();
        registry.register_fn("groovy", quiet_executor);
        registry.register_fn("js", quiet_executor);

        assert!(registry.contains("groovy"));
        assert!(registry.contains("js"));
        let mut exec = registry.create_default().unwrap();
        assert_eq!(exec.run(), Ok(serde_json::Value::Null));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let mut registry = ScriptEngineRegistry::new();
        registry.register_fn("groovy", quiet_executor);
        assert_eq!(
            registry.create("python").err(),
            Some(ScriptError::UnsupportedLanguage("python".into()))
        );
    }
}
