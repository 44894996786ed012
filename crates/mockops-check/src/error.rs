//! Error types for check runs

use crate::phase::CheckPhase;
use mockops_script::ScriptError;

/// Failure raised by a check body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// The check ran and reported a failure
    #[error("check failed: {0}")]
    Failed(String),

    /// The test step lacks something the check needs
    #[error("test step [{step}] unusable: {message}")]
    InvalidStep {
        /// Step name
        step: String,
        /// What is wrong
        message: String,
    },

    /// Attempt to overwrite a reserved context key
    #[error("context key [{0}] is reserved")]
    ReservedKey(String),
}

/// What went wrong inside one phase
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    /// Setup or teardown script failed
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Check body returned an error
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Phase panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

impl PhaseError {
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked(message)
    }
}

/// Failure report handed to an [`crate::ErrorSink`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("check [{check}] failed during {phase} of step [{step}]: {error}")]
pub struct PhaseFailure {
    /// Check name
    pub check: String,
    /// Step the check ran against
    pub step: String,
    /// Phase that failed
    pub phase: CheckPhase,
    /// Cause
    #[source]
    pub error: PhaseError,
}
