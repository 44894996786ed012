//! Script-driven selection
//!
//! The script sees `request`, `responses` (names in order) and `log`, and
//! returns the name of the response to use. A `null` result, an unknown
//! name or a script failure defers to the default response.

use crate::request::MockRequest;
use crate::response::ResponseDefinition;
use crate::store::ResponseStore;
use crate::strategy::{DispatchStyle, SelectionStrategy};
use mockops_script::{ScriptExecutor, ScriptLog, ScriptValue};
use parking_lot::Mutex;
use std::sync::Arc;

/// Response chosen by a dispatch script
pub struct ScriptStrategy {
    owner: String,
    script: String,
    executor: Mutex<Box<dyn ScriptExecutor>>,
}

impl ScriptStrategy {
    /// Create strategy running `script` on `executor`
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        script: impl Into<String>,
        executor: Box<dyn ScriptExecutor>,
    ) -> Self {
        Self {
            owner: owner.into(),
            script: script.into(),
            executor: Mutex::new(executor),
        }
    }

    /// Script body
    #[inline]
    #[must_use]
    pub fn script(&self) -> &str {
        &self.script
    }
}

impl std::fmt::Debug for ScriptStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptStrategy")
            .field("owner", &self.owner)
            .field("script_len", &self.script.len())
            .finish_non_exhaustive()
    }
}

impl SelectionStrategy for ScriptStrategy {
    fn select(
        &self,
        request: &MockRequest,
        store: &ResponseStore,
    ) -> Option<Arc<ResponseDefinition>> {
        let outcome = {
            let mut executor = self.executor.lock();
            executor.set_script(&self.script);
            executor.set_variable("request", ScriptValue::json(request));
            executor.set_variable("responses", ScriptValue::json(&store.names()));
            executor.set_variable("log", ScriptLog::new(self.owner.clone()).into());
            let outcome = executor.run();
            executor.clear_variables();
            outcome
        };

        match outcome {
            Ok(serde_json::Value::String(name)) => {
                let found = store.by_name(&name);
                if found.is_none() {
                    tracing::warn!(
                        "dispatch script of [{}] returned unknown response [{}]",
                        self.owner,
                        name
                    );
                }
                found
            }
            Ok(serde_json::Value::Null) => None,
            Ok(other) => {
                tracing::warn!(
                    "dispatch script of [{}] returned non-string value {}",
                    self.owner,
                    other
                );
                None
            }
            Err(e) => {
                tracing::warn!("dispatch script of [{}] failed: {}", self.owner, e);
                None
            }
        }
    }

    fn style(&self) -> DispatchStyle {
        DispatchStyle::Script
    }

    fn release(&self) {
        self.executor.lock().release();
    }
}
