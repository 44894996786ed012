//! Error types for the model

use crate::ids::{InterfaceId, OperationId};

/// Model lookup and mutation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// No interface with this name
    #[error("missing interface [{0}]")]
    MissingInterface(String),

    /// Interface exists but has no operation with this name
    #[error("missing operation [{operation}] in interface [{interface}]")]
    MissingOperation {
        /// Interface that was searched
        interface: String,
        /// Operation name that was not found
        operation: String,
    },

    /// Interface id is not (or no longer) part of the model
    #[error("unknown interface id {0}")]
    UnknownInterface(InterfaceId),

    /// Operation id is not (or no longer) part of the model
    #[error("unknown operation id {0}")]
    UnknownOperation(OperationId),
}
