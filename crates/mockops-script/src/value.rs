//! Values bound into a script environment

use serde::Serialize;

/// Logger handed to scripts as a variable
///
/// Forwards to `tracing` under the `mockops::script` target, tagged with the
/// owner that bound it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLog {
    owner: String,
}

impl ScriptLog {
    /// Create logger for an owner (check or operation name)
    #[inline]
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    /// Owner tag
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Log at debug level
    pub fn debug(&self, message: &str) {
        tracing::debug!(target: "mockops::script", owner = %self.owner, "{}", message);
    }

    /// Log at info level
    pub fn info(&self, message: &str) {
        tracing::info!(target: "mockops::script", owner = %self.owner, "{}", message);
    }

    /// Log at warn level
    pub fn warn(&self, message: &str) {
        tracing::warn!(target: "mockops::script", owner = %self.owner, "{}", message);
    }

    /// Log at error level
    pub fn error(&self, message: &str) {
        tracing::error!(target: "mockops::script", owner = %self.owner, "{}", message);
    }
}

/// Variable value
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// Structured data
    Json(serde_json::Value),

    /// Plain text
    Text(String),

    /// Logger handle
    Log(ScriptLog),
}

impl ScriptValue {
    /// Serialize any value into a JSON variable
    ///
    /// Falls back to `null` when the value cannot be represented as JSON.
    #[must_use]
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self::Json(v),
            Err(e) => {
                tracing::warn!("script variable not representable as json: {}", e);
                Self::Json(serde_json::Value::Null)
            }
        }
    }

    /// Text content, if this is a text value
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<ScriptLog> for ScriptValue {
    fn from(value: ScriptLog) -> Self {
        Self::Log(value)
    }
}
