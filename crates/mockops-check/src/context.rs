//! Test step and per-run context

use crate::error::CheckError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Key under which the context exposes the running check
pub const CHECK_RUNNER_KEY: &str = "checkRunner";

/// Target a check runs against (bound into scripts as `testStep`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    /// Step name
    pub name: String,
    /// Step type (e.g. `request`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    /// Step properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl TestStep {
    /// Create step
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set step type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, step_type: impl Into<String>) -> Self {
        self.step_type = Some(step_type.into());
        self
    }

    /// Add a property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Property value
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Context of one check run, handed to the check body
#[derive(Debug, Clone)]
pub struct CheckContext {
    run_id: Uuid,
    check: String,
    started_at: DateTime<Utc>,
    properties: BTreeMap<String, serde_json::Value>,
}

impl CheckContext {
    /// Fresh context for a run of `check`
    #[must_use]
    pub fn new(check: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            check: check.into(),
            started_at: Utc::now(),
            properties: BTreeMap::new(),
        }
    }

    /// Run id
    #[inline]
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Check name
    #[inline]
    #[must_use]
    pub fn check(&self) -> &str {
        &self.check
    }

    /// Run start time
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Property value
    ///
    /// [`CHECK_RUNNER_KEY`] yields a description of the running check.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        if key == CHECK_RUNNER_KEY {
            return Some(serde_json::json!({
                "check": self.check,
                "run_id": self.run_id.to_string(),
                "started_at": self.started_at.to_rfc3339(),
            }));
        }
        self.properties.get(key).cloned()
    }

    /// Set a property
    ///
    /// # Errors
    /// `CheckError::ReservedKey` for [`CHECK_RUNNER_KEY`]
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) -> Result<(), CheckError> {
        let key = key.into();
        if key == CHECK_RUNNER_KEY {
            return Err(CheckError::ReservedKey(key));
        }
        self.properties.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_key_describes_runner() {
        let mut ctx = CheckContext::new("xss");
        let runner = ctx.get(CHECK_RUNNER_KEY).unwrap();
        assert_eq!(runner["check"], "xss");
        assert_eq!(runner["run_id"], ctx.run_id().to_string());

        assert_eq!(
            ctx.set(CHECK_RUNNER_KEY, serde_json::Value::Null),
            Err(CheckError::ReservedKey(CHECK_RUNNER_KEY.into()))
        );
        ctx.set("attempts", serde_json::json!(3)).unwrap();
        assert_eq!(ctx.get("attempts"), Some(serde_json::json!(3)));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn step_properties() {
        let step = TestStep::new("Get").with_type("request").with_property("endpoint", "/a");
        assert_eq!(step.property("endpoint"), Some("/a"));
        assert_eq!(step.step_type.as_deref(), Some("request"));
    }
}
