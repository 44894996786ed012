//! Script executor trait

use crate::value::ScriptValue;

/// Script failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// Body did not compile
    #[error("script compile error: {0}")]
    Compile(String),

    /// Body raised while running
    #[error("script runtime error{}: {message}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Runtime {
        /// Engine message
        message: String,
        /// Line number, if the engine reports one
        line: Option<u32>,
    },

    /// Body referenced a variable that was never bound
    #[error("unbound script variable: {0}")]
    UnboundVariable(String),

    /// No engine registered for the language
    #[error("no script engine for language: {0}")]
    UnsupportedLanguage(String),
}

impl ScriptError {
    /// Runtime error without line information
    #[inline]
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            line: None,
        }
    }
}

/// One script engine instance and its variable environment
///
/// Callers follow the sequence `set_script` → `set_variable`* → `run` →
/// `clear_variables`. Implementations own their own timeouts, if any.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptExecutor: Send {
    /// Load the body to run next
    fn set_script(&mut self, body: &str);

    /// Bind a named variable
    fn set_variable(&mut self, name: &str, value: ScriptValue);

    /// Run the loaded body against the bound variables
    ///
    /// # Errors
    /// Any [`ScriptError`] raised by the engine
    fn run(&mut self) -> Result<serde_json::Value, ScriptError>;

    /// Drop every bound variable
    fn clear_variables(&mut self);

    /// Release engine resources
    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn runtime_error_display_with_line() {
        let err = ScriptError::Runtime {
            message: "boom".into(),
            line: Some(3),
        };
        assert_eq!(err.to_string(), "script runtime error at line 3: boom");
        assert_eq!(
            ScriptError::runtime("boom").to_string(),
            "script runtime error: boom"
        );
    }

    #[test]
    fn mock_executor_follows_call_sequence() {
        let mut seq = mockall::Sequence::new();
        let mut exec = MockScriptExecutor::new();
        exec.expect_set_script()
            .with(eq("return 1"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        exec.expect_set_variable()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        exec.expect_run()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(serde_json::json!(1)));
        exec.expect_clear_variables()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        exec.set_script("return 1");
        exec.set_variable("x", ScriptValue::from("y"));
        assert_eq!(exec.run(), Ok(serde_json::json!(1)));
        exec.clear_variables();
    }
}
