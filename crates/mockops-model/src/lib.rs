//! mockops Model
//!
//! The live interface/operation model that mock operations are bound to.
//!
//! # Overview
//!
//! - [`Project`]: in-memory catalogue of interfaces and their operations
//! - [`OperationRef`]: identity-based reference to one operation
//! - [`ModelEvent`]: closed set of lifecycle events (rename/remove)
//! - [`EventBus`]: listener registry that delivers [`ModelEvent`]s
//!
//! # Example
//!
//! ```rust
//! use mockops_model::{OperationDirection, Project, ServiceModel};
//!
//! let project = Project::new("billing");
//! let iface = project.add_interface("BillingPort");
//! let op = project.add_operation(iface, "GetInvoice", OperationDirection::RequestResponse).unwrap();
//!
//! let resolved = project.resolve("BillingPort", "GetInvoice").unwrap();
//! assert_eq!(resolved.operation, op);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod ids;
pub mod project;

// Re-exports
pub use error::ModelError;
pub use events::{EventBus, ModelEvent, ModelListener};
pub use ids::{InterfaceId, OperationId, SubscriptionId};
pub use project::{
    Interface, Operation, OperationDirection, OperationRef, Project, ResponseTemplate,
    ServiceModel,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
