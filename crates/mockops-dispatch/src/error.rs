//! Error types for dispatch
//!
//! [`DispatchError`] is the only error a caller of
//! [`crate::MockOperation::dispatch`] ever sees; every internal fault is
//! normalized into one of its three variants.

use mockops_model::ModelError;
use mockops_script::ScriptError;
use std::path::PathBuf;

/// Boxed error carried as the cause of an execution failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dispatch failures
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Dispatch attempted against an empty store
    #[error("missing mock response(s) in mock operation [{operation}]")]
    NoResponsesConfigured {
        /// Mock operation name
        operation: String,
    },

    /// Neither the strategy nor the default produced a response
    #[error("failed to find mock response in mock operation [{operation}]")]
    NoResponseResolved {
        /// Mock operation name
        operation: String,
    },

    /// The selected response (or anything else after selection) failed
    #[error("mock operation [{operation}] failed{}: {source}", .response.as_ref().map(|r| format!(" in response [{r}]")).unwrap_or_default())]
    ExecutionFailure {
        /// Mock operation name
        operation: String,
        /// Response being executed, if one was selected
        response: Option<String>,
        /// Original cause
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Wrap any failure as an execution failure
    #[inline]
    pub fn execution(
        operation: impl Into<String>,
        response: Option<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ExecutionFailure {
            operation: operation.into(),
            response,
            source: source.into(),
        }
    }

    /// Mock operation the failure belongs to
    #[must_use]
    pub fn operation(&self) -> &str {
        match self {
            Self::NoResponsesConfigured { operation }
            | Self::NoResponseResolved { operation }
            | Self::ExecutionFailure { operation, .. } => operation,
        }
    }
}

/// A handler or strategy panicked during dispatch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("panicked: {0}")]
pub struct PanicError(pub String);

impl PanicError {
    /// Extract the message from a `catch_unwind` payload
    #[must_use]
    pub fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self(message)
    }
}

/// Response store violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Name already used by another entry
    #[error("duplicate mock response name [{0}]")]
    DuplicateName(String),

    /// No entry with this name
    #[error("unknown mock response [{0}]")]
    UnknownResponse(String),

    /// Index past the end of the store
    #[error("response index {index} out of range (len: {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Store length
        len: usize,
    },

    /// Entry names must not be empty
    #[error("mock response name must not be empty")]
    EmptyName,
}

/// Write-once violation on a [`crate::MockResult`] field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mock result field [{0}] already set")]
pub struct ResultError(pub &'static str);

/// Configuration loading and projection failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading or writing config
    #[error("io error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Extension does not map to a known format
    #[error("unknown config format for {0}")]
    UnknownFormat(PathBuf),

    /// Document could not be parsed
    #[error("invalid {format} config: {message}")]
    Parse {
        /// Format name
        format: &'static str,
        /// Parser message
        message: String,
    },

    /// Config could not be serialized
    #[error("cannot serialize config as {format}: {message}")]
    Serialize {
        /// Format name
        format: &'static str,
        /// Serializer message
        message: String,
    },

    /// Query-match rule pattern does not compile
    #[error("invalid match pattern [{pattern}]: {source}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Regex error
        #[source]
        source: regex::Error,
    },

    /// Script dispatch requested without a usable script
    #[error("script dispatch misconfigured: {0}")]
    Script(#[from] ScriptError),

    /// Response list violates store rules
    #[error("invalid responses: {0}")]
    Store(#[from] StoreError),

    /// Binding refers to something the model lacks
    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Mock service failures
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No mock operation with this name
    #[error("no mock operation [{0}] in service")]
    UnknownOperation(String),

    /// Dispatch failed inside the operation
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Operation could not be created
    #[error(transparent)]
    Config(#[from] ConfigError),
}
