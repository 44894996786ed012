//! Mock service
//!
//! Owns mock operations, routes requests to them by name and removes them
//! when their bound model operation disappears.

use crate::bridge::OperationOwner;
use crate::config::{InterfaceConfig, MockOperationConfig, MockServiceConfig, MockSettings};
use crate::error::{ConfigError, ServiceError};
use crate::notify::{Notifier, ServiceNotification};
use crate::operation::{MockOperation, MockOperationId, OperationContext};
use crate::registry::StrategyRegistry;
use crate::request::MockRequest;
use crate::response::{ResponseHandler, StaticResponseHandler};
use crate::result::MockResult;
use crossbeam::channel::Receiver;
use mockops_model::{OperationRef, ServiceModel};
use mockops_script::ScriptEngineRegistry;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Pluggable collaborators of a service
#[derive(Clone)]
pub struct ServiceParts {
    /// Builds selection strategies
    pub strategies: Arc<StrategyRegistry>,
    /// Executes selected responses
    pub handler: Arc<dyn ResponseHandler>,
}

impl Default for ServiceParts {
    fn default() -> Self {
        Self {
            strategies: Arc::new(StrategyRegistry::new()),
            handler: Arc::new(StaticResponseHandler::new()),
        }
    }
}

impl ServiceParts {
    /// Parts with script engines for `script` dispatch
    #[must_use]
    pub fn with_engines(engines: ScriptEngineRegistry) -> Self {
        Self {
            strategies: Arc::new(StrategyRegistry::with_engines(engines)),
            ..Self::default()
        }
    }

    /// Replace the response handler
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.handler = handler;
        self
    }
}

impl std::fmt::Debug for ServiceParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceParts")
            .field("strategies", &self.strategies)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Mock service
pub struct MockService {
    name: String,
    path: String,
    port: u16,
    settings: MockSettings,
    interfaces: Vec<InterfaceConfig>,
    model: Arc<dyn ServiceModel>,
    parts: ServiceParts,
    operations: RwLock<Vec<Arc<MockOperation>>>,
    notifier: Notifier<ServiceNotification>,
    this: Weak<MockService>,
    released: AtomicBool,
}

impl MockService {
    /// Create an empty service over `model`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        model: Arc<dyn ServiceModel>,
        settings: MockSettings,
        parts: ServiceParts,
    ) -> Arc<Self> {
        let mut config = MockServiceConfig::new(name);
        config.settings = settings;
        Self::assemble(&config, model, parts)
    }

    /// Build a service and its operations from config
    ///
    /// # Errors
    /// `ConfigError` if any operation config is invalid
    pub fn from_config(
        config: &MockServiceConfig,
        model: Arc<dyn ServiceModel>,
        parts: ServiceParts,
    ) -> Result<Arc<Self>, ConfigError> {
        let service = Self::assemble(config, model, parts);
        for op in &config.operations {
            service.add_mock_operation(op)?;
        }
        tracing::info!(
            "mock service [{}] ready with {} operation(s)",
            service.name,
            service.operation_count()
        );
        Ok(service)
    }

    fn assemble(
        config: &MockServiceConfig,
        model: Arc<dyn ServiceModel>,
        parts: ServiceParts,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            name: config.name.clone(),
            path: config.path.clone(),
            port: config.port,
            settings: config.settings.clone(),
            interfaces: config.interfaces.clone(),
            model,
            parts,
            operations: RwLock::new(Vec::new()),
            notifier: Notifier::new(),
            this: this.clone(),
            released: AtomicBool::new(false),
        })
    }

    /// Service name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live model
    #[inline]
    #[must_use]
    pub fn model(&self) -> &Arc<dyn ServiceModel> {
        &self.model
    }

    /// Settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &MockSettings {
        &self.settings
    }

    fn context(&self) -> OperationContext {
        let owner: Weak<dyn OperationOwner> = self.this.clone();
        OperationContext::new()
            .with_model(Arc::clone(&self.model))
            .with_owner(owner)
            .with_strategies(Arc::clone(&self.parts.strategies))
            .with_handler(Arc::clone(&self.parts.handler))
            .with_settings(self.settings.clone())
    }

    fn insert(&self, operation: MockOperation) -> Arc<MockOperation> {
        let operation = Arc::new(operation);
        let name = operation.name();
        self.operations.write().push(Arc::clone(&operation));
        tracing::info!("added mock operation [{}] to [{}]", name, self.name);
        self.notifier
            .notify(&ServiceNotification::OperationAdded { name });
        operation
    }

    /// Add a mock operation from config
    ///
    /// # Errors
    /// `ConfigError` for invalid responses or dispatch config
    pub fn add_mock_operation(
        &self,
        config: &MockOperationConfig,
    ) -> Result<Arc<MockOperation>, ConfigError> {
        let operation = MockOperation::from_config(config, self.context())?;
        Ok(self.insert(operation))
    }

    /// Add an empty mock operation bound to a model operation
    ///
    /// # Errors
    /// `ConfigError::Model` if the reference does not resolve
    pub fn add_operation_for(
        &self,
        name: impl Into<String>,
        reference: OperationRef,
    ) -> Result<Arc<MockOperation>, ConfigError> {
        let operation = MockOperation::for_operation(name, reference, self.context())?;
        Ok(self.insert(operation))
    }

    /// Mock operation by id
    #[must_use]
    pub fn mock_operation(&self, id: MockOperationId) -> Option<Arc<MockOperation>> {
        self.operations
            .read()
            .iter()
            .find(|op| op.id() == id)
            .cloned()
    }

    /// Mock operation by its own name
    #[must_use]
    pub fn mock_operation_by_name(&self, name: &str) -> Option<Arc<MockOperation>> {
        self.operations
            .read()
            .iter()
            .find(|op| op.name() == name)
            .cloned()
    }

    /// First mock operation bound to a model operation with this name
    #[must_use]
    pub fn mock_operation_for(&self, operation_name: &str) -> Option<Arc<MockOperation>> {
        self.operations
            .read()
            .iter()
            .find(|op| op.operation_name().as_deref() == Some(operation_name))
            .cloned()
    }

    /// All mock operations in insertion order
    #[must_use]
    pub fn operations(&self) -> Vec<Arc<MockOperation>> {
        self.operations.read().clone()
    }

    /// Number of mock operations
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.read().len()
    }

    /// Route a request to a mock operation
    ///
    /// `name` is matched against mock operation names first, then against
    /// bound operation names.
    ///
    /// # Errors
    /// - `ServiceError::UnknownOperation` if nothing matches
    /// - `ServiceError::Dispatch` if the operation fails
    pub fn dispatch(&self, name: &str, request: &mut MockRequest) -> Result<MockResult, ServiceError> {
        let operation = self
            .mock_operation_by_name(name)
            .or_else(|| self.mock_operation_for(name))
            .ok_or_else(|| ServiceError::UnknownOperation(name.to_string()))?;
        Ok(operation.dispatch(request)?)
    }

    /// Subscribe to service notifications
    pub fn subscribe(&self) -> Receiver<ServiceNotification> {
        self.notifier.subscribe()
    }

    /// Release every operation
    ///
    /// Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let operations = std::mem::take(&mut *self.operations.write());
        for operation in &operations {
            operation.release();
        }
        tracing::info!(
            "released mock service [{}] ({} operation(s))",
            self.name,
            operations.len()
        );
    }

    /// Persisted projection
    #[must_use]
    pub fn to_config(&self) -> MockServiceConfig {
        MockServiceConfig {
            name: self.name.clone(),
            path: self.path.clone(),
            port: self.port,
            settings: self.settings.clone(),
            interfaces: self.interfaces.clone(),
            operations: self
                .operations
                .read()
                .iter()
                .map(|op| op.to_config())
                .collect(),
        }
    }
}

impl OperationOwner for MockService {
    fn remove_mock_operation(&self, id: MockOperationId) -> bool {
        let removed = {
            let mut operations = self.operations.write();
            operations
                .iter()
                .position(|op| op.id() == id)
                .map(|idx| operations.remove(idx))
        };
        let Some(operation) = removed else {
            return false;
        };

        operation.release();
        let name = operation.name();
        tracing::info!("removed mock operation [{}] from [{}]", name, self.name);
        self.notifier
            .notify(&ServiceNotification::OperationRemoved { name });
        true
    }

    fn response_added(&self, operation: &str, response: &str) {
        self.notifier.notify(&ServiceNotification::ResponseAdded {
            operation: operation.to_string(),
            response: response.to_string(),
        });
    }
}

impl std::fmt::Debug for MockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockService")
            .field("name", &self.name)
            .field("operations", &self.operation_count())
            .finish_non_exhaustive()
    }
}
