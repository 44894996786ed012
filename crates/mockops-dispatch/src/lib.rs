//! mockops Dispatch
//!
//! Selects and executes one response for an inbound mock request while the
//! bound interface/operation model changes underneath.
//!
//! # Core Concepts
//!
//! - [`ResponseStore`]: ordered, uniquely named responses with one default
//! - [`SelectionStrategy`]: pluggable response selection for a request
//! - [`MockOperation`]: owns a store and a strategy, dispatches requests
//! - [`ModelSyncBridge`]: keeps an operation's identity in step with the model
//! - [`MockService`]: owns mock operations and routes requests to them
//!
//! # Example
//!
//! ```rust,ignore
//! use mockops_dispatch::{MockRequest, MockService, MockServiceConfig};
//!
//! let config = MockServiceConfig::load("service.yaml")?;
//! let project = std::sync::Arc::new(config.build_project());
//! let service = MockService::from_config(&config, project, Default::default())?;
//!
//! let mut request = MockRequest::new("<getInvoice/>");
//! let result = service.dispatch("GetInvoice", &mut request)?;
//! println!("{:?}", result.response_name());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bridge;
mod config;
mod error;
mod notify;
mod operation;
mod query_match;
mod random;
mod registry;
mod request;
mod response;
mod result;
mod scripted;
mod sequence;
mod service;
mod store;
mod strategy;

// Re-exports
pub use bridge::{BridgeState, ModelSyncBridge, OperationOwner};
pub use config::{
    ConfigFormat, DispatchConfig, InterfaceConfig, MatchRule, MatchSource, MockOperationConfig,
    MockServiceConfig, MockSettings, OperationConfig,
};
pub use error::{
    BoxError, ConfigError, DispatchError, PanicError, ResultError, ServiceError, StoreError,
};
pub use notify::{Notifier, OperationNotification, ServiceNotification};
pub use operation::{MockOperation, MockOperationId, OperationBinding, OperationContext};
pub use query_match::QueryMatchStrategy;
pub use random::RandomStrategy;
pub use registry::StrategyRegistry;
pub use request::{MockRequest, RequestId};
pub use response::{ResponseDefinition, ResponseHandler, StaticResponseHandler};
pub use result::{MockResult, ResponseOutput, ResultSummary};
pub use scripted::ScriptStrategy;
pub use sequence::SequenceStrategy;
pub use service::{MockService, ServiceParts};
pub use store::ResponseStore;
pub use strategy::{DefaultOnlyStrategy, DispatchStyle, SelectionStrategy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
