//! Mock operation
//!
//! A [`MockOperation`] owns a [`ResponseStore`] and a selection strategy,
//! carries its binding to a model operation and dispatches requests.
//!
//! # Dispatch order
//!
//! 1. Bind the resolved operation onto the request
//! 2. Fail with `NoResponsesConfigured` on an empty store
//! 3. Ask the strategy; fall back to the default response
//! 4. Fail with `NoResponseResolved` if neither produced one
//! 5. Execute the response through the [`ResponseHandler`]
//!
//! Every failure after step 4, including panics, surfaces as
//! `DispatchError::ExecutionFailure`.

use crate::bridge::{BridgeState, ModelSyncBridge, OperationOwner};
use crate::config::{DispatchConfig, MockOperationConfig, MockSettings};
use crate::error::{BoxError, ConfigError, DispatchError, PanicError, StoreError};
use crate::notify::{Notifier, OperationNotification};
use crate::registry::StrategyRegistry;
use crate::request::MockRequest;
use crate::response::{ResponseDefinition, ResponseHandler, StaticResponseHandler};
use crate::result::MockResult;
use crate::store::ResponseStore;
use crate::strategy::{DispatchStyle, SelectionStrategy};
use crossbeam::channel::Receiver;
use mockops_model::{ModelError, Operation, OperationDirection, OperationRef, ServiceModel};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use ulid::Ulid;

/// Identity of a mock operation within its service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MockOperationId(pub Ulid);

impl MockOperationId {
    /// Generate new id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for MockOperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MockOperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Link from a mock operation to a model operation
///
/// `reference` is the identity used for event matching; the names are the
/// persisted form and survive even when the reference does not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationBinding {
    /// Resolved model identity
    pub reference: Option<OperationRef>,
    /// Interface name
    pub interface_name: Option<String>,
    /// Operation name
    pub operation_name: Option<String>,
}

impl OperationBinding {
    /// Binding to a resolved operation
    #[must_use]
    pub fn bound(
        reference: OperationRef,
        interface_name: impl Into<String>,
        operation_name: impl Into<String>,
    ) -> Self {
        Self {
            reference: Some(reference),
            interface_name: Some(interface_name.into()),
            operation_name: Some(operation_name.into()),
        }
    }

    /// Persisted names without a resolved identity
    #[inline]
    #[must_use]
    pub fn unresolved(interface_name: Option<String>, operation_name: Option<String>) -> Self {
        Self {
            reference: None,
            interface_name,
            operation_name,
        }
    }

    /// Check if the binding resolved against the model
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.reference.is_some()
    }

    fn describe(model: &dyn ServiceModel, reference: OperationRef) -> Result<Self, ModelError> {
        let operation = model
            .operation(reference)
            .ok_or(ModelError::UnknownOperation(reference.operation))?;
        let interface = model
            .interface(reference.interface)
            .ok_or(ModelError::UnknownInterface(reference.interface))?;
        Ok(Self::bound(reference, interface.name, operation.name))
    }
}

struct Unowned;

impl OperationOwner for Unowned {
    fn remove_mock_operation(&self, _id: MockOperationId) -> bool {
        false
    }
}

/// Collaborators shared by the operations of one service
#[derive(Clone)]
pub struct OperationContext {
    model: Option<Arc<dyn ServiceModel>>,
    owner: Weak<dyn OperationOwner>,
    strategies: Arc<StrategyRegistry>,
    handler: Arc<dyn ResponseHandler>,
    settings: MockSettings,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self {
            model: None,
            owner: Weak::<Unowned>::new(),
            strategies: Arc::new(StrategyRegistry::new()),
            handler: Arc::new(StaticResponseHandler::new()),
            settings: MockSettings::default(),
        }
    }
}

impl OperationContext {
    /// Context without model or owner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a live model
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn ServiceModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// With an owner
    #[must_use]
    pub fn with_owner(mut self, owner: Weak<dyn OperationOwner>) -> Self {
        self.owner = owner;
        self
    }

    /// With a strategy registry
    #[must_use]
    pub fn with_strategies(mut self, strategies: Arc<StrategyRegistry>) -> Self {
        self.strategies = strategies;
        self
    }

    /// With a response handler
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn ResponseHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// With settings
    #[must_use]
    pub fn with_settings(mut self, settings: MockSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Live model, if any
    #[inline]
    #[must_use]
    pub fn model(&self) -> Option<&Arc<dyn ServiceModel>> {
        self.model.as_ref()
    }

    /// Settings
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &MockSettings {
        &self.settings
    }
}

impl std::fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("has_model", &self.model.is_some())
            .field("strategies", &self.strategies)
            .field("handler", &self.handler)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

struct DispatchState {
    config: DispatchConfig,
    strategy: Arc<dyn SelectionStrategy>,
}

/// Mock operation
pub struct MockOperation {
    id: MockOperationId,
    name: RwLock<String>,
    binding: Arc<RwLock<OperationBinding>>,
    store: RwLock<ResponseStore>,
    dispatch: RwLock<DispatchState>,
    context: OperationContext,
    bridge: Mutex<Option<ModelSyncBridge>>,
    notifier: Notifier<OperationNotification>,
    released: AtomicBool,
}

impl MockOperation {
    /// Create an unbound, empty mock operation
    ///
    /// # Errors
    /// `ConfigError` if the default dispatch style cannot be built
    pub fn new(name: impl Into<String>, context: OperationContext) -> Result<Self, ConfigError> {
        let dispatch = DispatchConfig::style(context.settings.default_dispatch_style);
        Self::build(
            name.into(),
            OperationBinding::default(),
            ResponseStore::new(),
            dispatch,
            context,
        )
    }

    /// Create a mock operation bound to a model operation
    ///
    /// # Errors
    /// `ConfigError::Model` if the context has no model or the reference
    /// does not resolve
    pub fn for_operation(
        name: impl Into<String>,
        reference: OperationRef,
        context: OperationContext,
    ) -> Result<Self, ConfigError> {
        let model = context
            .model
            .as_deref()
            .ok_or(ModelError::UnknownOperation(reference.operation))?;
        let binding = OperationBinding::describe(model, reference)?;
        let dispatch = DispatchConfig::style(context.settings.default_dispatch_style);
        Self::build(name.into(), binding, ResponseStore::new(), dispatch, context)
    }

    /// Rebuild a mock operation from persisted config
    ///
    /// A binding that does not resolve is kept by name and logged.
    ///
    /// # Errors
    /// `ConfigError` for invalid responses or an unbuildable dispatch config
    pub fn from_config(
        config: &MockOperationConfig,
        context: OperationContext,
    ) -> Result<Self, ConfigError> {
        let store =
            ResponseStore::from_parts(config.responses.iter().cloned(), config.default_response.clone())?;
        let binding = Self::resolve_binding(config, context.model.as_deref());
        Self::build(
            config.name.clone(),
            binding,
            store,
            config.dispatch.clone(),
            context,
        )
    }

    fn resolve_binding(
        config: &MockOperationConfig,
        model: Option<&dyn ServiceModel>,
    ) -> OperationBinding {
        let unresolved =
            OperationBinding::unresolved(config.interface.clone(), config.operation.clone());
        let (Some(model), Some(interface), Some(operation)) =
            (model, config.interface.as_deref(), config.operation.as_deref())
        else {
            return unresolved;
        };

        match model.resolve(interface, operation) {
            Ok(reference) => OperationBinding::bound(reference, interface, operation),
            Err(ModelError::MissingInterface(_)) => {
                tracing::warn!(
                    "missing interface [{}] for mock operation [{}]",
                    interface,
                    config.name
                );
                unresolved
            }
            Err(e) => {
                tracing::warn!("mock operation [{}] unresolved: {}", config.name, e);
                unresolved
            }
        }
    }

    fn build(
        name: String,
        binding: OperationBinding,
        store: ResponseStore,
        dispatch: DispatchConfig,
        context: OperationContext,
    ) -> Result<Self, ConfigError> {
        let strategy = context.strategies.build(&dispatch, &name)?;
        let id = MockOperationId::new();
        let binding = Arc::new(RwLock::new(binding));

        let bridge = context.model.as_ref().map(|model| {
            ModelSyncBridge::attach(
                Arc::clone(model),
                id,
                Arc::downgrade(&binding),
                context.owner.clone(),
            )
        });

        tracing::info!(
            "created mock operation [{}] with {} response(s), {} dispatch",
            name,
            store.len(),
            dispatch.style
        );

        Ok(Self {
            id,
            name: RwLock::new(name),
            binding,
            store: RwLock::new(store),
            dispatch: RwLock::new(DispatchState {
                config: dispatch,
                strategy,
            }),
            context,
            bridge: Mutex::new(bridge),
            notifier: Notifier::new(),
            released: AtomicBool::new(false),
        })
    }

    /// Operation id
    #[inline]
    #[must_use]
    pub fn id(&self) -> MockOperationId {
        self.id
    }

    /// Operation name
    #[must_use]
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Rename the mock operation
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// Current binding
    #[must_use]
    pub fn binding(&self) -> OperationBinding {
        self.binding.read().clone()
    }

    /// Bound interface name
    #[must_use]
    pub fn interface_name(&self) -> Option<String> {
        self.binding.read().interface_name.clone()
    }

    /// Bound operation name
    #[must_use]
    pub fn operation_name(&self) -> Option<String> {
        self.binding.read().operation_name.clone()
    }

    /// Bind to a model operation, or unbind with `None`
    ///
    /// Notifies [`OperationNotification::OperationChanged`].
    ///
    /// # Errors
    /// `ModelError` if the reference does not resolve (or there is no model)
    pub fn set_operation(&self, reference: Option<OperationRef>) -> Result<(), ModelError> {
        let next = match reference {
            None => OperationBinding::default(),
            Some(reference) => {
                let model = self
                    .context
                    .model
                    .as_deref()
                    .ok_or(ModelError::UnknownOperation(reference.operation))?;
                OperationBinding::describe(model, reference)?
            }
        };

        let old = std::mem::replace(&mut *self.binding.write(), next).reference;
        self.notifier.notify(&OperationNotification::OperationChanged {
            old,
            new: reference,
        });
        Ok(())
    }

    /// Snapshot of the bound model operation
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        let reference = self.binding.read().reference?;
        self.context.model.as_ref()?.operation(reference)
    }

    /// Exchange pattern of the bound operation
    #[must_use]
    pub fn direction(&self) -> Option<OperationDirection> {
        self.operation().map(|op| op.direction)
    }

    /// Bound operation is one-way
    #[must_use]
    pub fn is_one_way(&self) -> bool {
        self.direction() == Some(OperationDirection::OneWay)
    }

    /// Bound operation is a notification
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.direction() == Some(OperationDirection::Notification)
    }

    /// Bound operation is solicit-response
    #[must_use]
    pub fn is_solicit_response(&self) -> bool {
        self.direction() == Some(OperationDirection::SolicitResponse)
    }

    /// Bound operation carries a single message
    #[must_use]
    pub fn is_unidirectional(&self) -> bool {
        self.direction().is_some_and(OperationDirection::is_unidirectional)
    }

    /// Bound operation is not known to be unidirectional
    ///
    /// An unresolved binding counts as bidirectional.
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        !self.is_unidirectional()
    }

    /// Add a response
    ///
    /// The first response becomes the default.
    ///
    /// # Errors
    /// `StoreError` for an empty or duplicate name
    pub fn add_response(&self, definition: ResponseDefinition) -> Result<usize, StoreError> {
        let name = definition.name.clone();
        let (index, old_default, new_default) = {
            let mut store = self.store.write();
            let old_default = store.default_name().to_string();
            let index = store.add(definition)?;
            (index, old_default, store.default_name().to_string())
        };

        self.notifier
            .notify(&OperationNotification::ResponseAdded { name: name.clone() });
        if old_default != new_default {
            self.notifier.notify(&OperationNotification::DefaultChanged {
                old: old_default,
                new: new_default,
            });
        }
        if let Some(owner) = self.context.owner.upgrade() {
            owner.response_added(&self.name(), &name);
        }
        Ok(index)
    }

    /// Add a response named `name`
    ///
    /// With `create_content`, content is generated from the bound
    /// operation's response template when the operation is bidirectional
    /// and content generation is enabled.
    ///
    /// # Errors
    /// `StoreError` for an empty or duplicate name
    pub fn new_response(
        &self,
        name: impl Into<String>,
        create_content: bool,
    ) -> Result<usize, StoreError> {
        let settings = &self.context.settings;
        let content = if create_content && settings.generate_response_content {
            self.operation()
                .filter(|op| op.direction.is_bidirectional())
                .and_then(|op| op.response_template)
                .map(|t| t.render(settings.include_optional_elements))
                .unwrap_or_default()
        } else {
            String::new()
        };
        self.add_response(ResponseDefinition::new(name, content))
    }

    /// Remove the response at `index`
    ///
    /// Removing the default leaves no usable default.
    ///
    /// # Errors
    /// `StoreError::IndexOutOfRange`
    pub fn remove_response(&self, index: usize) -> Result<Arc<ResponseDefinition>, StoreError> {
        let removed = self.store.write().remove_at(index)?;
        self.notifier.notify(&OperationNotification::ResponseRemoved {
            name: removed.name.clone(),
        });
        Ok(removed)
    }

    /// Rename a response, moving the default with it
    ///
    /// # Errors
    /// `StoreError` for an unknown old name or a taken new name
    pub fn rename_response(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let was_default = self.store.write().rename(old, new)?;
        if old == new {
            return Ok(());
        }
        self.notifier.notify(&OperationNotification::ResponseRenamed {
            old: old.to_string(),
            new: new.to_string(),
        });
        if was_default {
            self.notifier.notify(&OperationNotification::DefaultChanged {
                old: old.to_string(),
                new: new.to_string(),
            });
        }
        Ok(())
    }

    /// Designate the default response (empty name clears it)
    ///
    /// # Errors
    /// `StoreError::UnknownResponse` for a name not in the store
    pub fn set_default_response(&self, name: &str) -> Result<(), StoreError> {
        let old = {
            let mut store = self.store.write();
            let old = store.default_name().to_string();
            store.set_default(name)?;
            old
        };
        if old != name {
            self.notifier.notify(&OperationNotification::DefaultChanged {
                old,
                new: name.to_string(),
            });
        }
        Ok(())
    }

    /// Default response name (may be empty or dangling)
    #[must_use]
    pub fn default_response_name(&self) -> String {
        self.store.read().default_name().to_string()
    }

    /// Response by name
    #[must_use]
    pub fn response_by_name(&self, name: &str) -> Option<Arc<ResponseDefinition>> {
        self.store.read().by_name(name)
    }

    /// Response by index
    #[must_use]
    pub fn response_at(&self, index: usize) -> Option<Arc<ResponseDefinition>> {
        self.store.read().get(index)
    }

    /// Number of responses
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.store.read().len()
    }

    /// Response names in order
    #[must_use]
    pub fn response_names(&self) -> Vec<String> {
        self.store.read().names()
    }

    /// Current dispatch style
    #[must_use]
    pub fn dispatch_style(&self) -> DispatchStyle {
        self.dispatch.read().strategy.style()
    }

    /// Current dispatch config
    #[must_use]
    pub fn dispatch_config(&self) -> DispatchConfig {
        self.dispatch.read().config.clone()
    }

    /// Replace the dispatch config, releasing the previous strategy
    ///
    /// # Errors
    /// `ConfigError` if the config cannot be built; the old strategy stays
    pub fn set_dispatch_config(&self, config: DispatchConfig) -> Result<(), ConfigError> {
        let strategy = self.context.strategies.build(&config, &self.name())?;
        let old = {
            let mut state = self.dispatch.write();
            state.config = config;
            std::mem::replace(&mut state.strategy, strategy)
        };
        old.release();
        Ok(())
    }

    /// Install a custom strategy, releasing the previous one
    pub fn set_strategy(&self, strategy: Arc<dyn SelectionStrategy>) {
        let old = {
            let mut state = self.dispatch.write();
            state.config = DispatchConfig::style(strategy.style());
            std::mem::replace(&mut state.strategy, strategy)
        };
        old.release();
    }

    /// Dispatch a request
    ///
    /// # Errors
    /// - `DispatchError::NoResponsesConfigured` for an empty store
    /// - `DispatchError::NoResponseResolved` if neither strategy nor default resolve
    /// - `DispatchError::ExecutionFailure` for anything that fails afterwards
    pub fn dispatch(&self, request: &mut MockRequest) -> Result<MockResult, DispatchError> {
        let started = Instant::now();
        let name = self.name();
        let binding = self.binding();
        request.set_operation(binding.clone());

        let result = MockResult::new(request);
        tracing::debug!("dispatching request {} to [{}]", request.id(), name);

        let response = {
            let store = self.store.read();
            if store.is_empty() {
                return Err(DispatchError::NoResponsesConfigured { operation: name });
            }
            result
                .set_mock_operation(name.clone(), binding)
                .map_err(|e| DispatchError::execution(&name, None, e))?;

            let strategy = Arc::clone(&self.dispatch.read().strategy);
            let picked = panic::catch_unwind(AssertUnwindSafe(|| strategy.select(request, &store)))
                .map_err(|p| {
                    DispatchError::execution(&name, None, PanicError::from_payload(p.as_ref()))
                })?;
            picked.or_else(|| store.default_response())
        };

        let Some(response) = response else {
            return Err(DispatchError::NoResponseResolved { operation: name });
        };
        let failed =
            |e: BoxError| DispatchError::execution(&name, Some(response.name.clone()), e);

        result
            .set_response(response.name.clone())
            .map_err(|e| failed(e.into()))?;

        let handler = Arc::clone(&self.context.handler);
        panic::catch_unwind(AssertUnwindSafe(|| {
            handler.execute(&response, request, &result)
        }))
        .map_err(|p| failed(PanicError::from_payload(p.as_ref()).into()))?
        .map_err(failed)?;

        result
            .set_time_taken(started.elapsed())
            .map_err(|e| failed(e.into()))?;
        tracing::debug!("[{}] answered with [{}]", name, response.name);
        Ok(result)
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> Receiver<OperationNotification> {
        self.notifier.subscribe()
    }

    /// State of the model subscription
    #[must_use]
    pub fn bridge_state(&self) -> BridgeState {
        self.bridge
            .lock()
            .as_ref()
            .map_or(BridgeState::Detached, ModelSyncBridge::state)
    }

    /// Persisted projection
    #[must_use]
    pub fn to_config(&self) -> MockOperationConfig {
        let binding = self.binding();
        let store = self.store.read();
        let default = store.default_name();
        MockOperationConfig {
            name: self.name(),
            interface: binding.interface_name,
            operation: binding.operation_name,
            default_response: (!default.is_empty()).then(|| default.to_string()),
            dispatch: self.dispatch_config(),
            responses: store.iter().map(|r| ResponseDefinition::clone(r)).collect(),
        }
    }

    /// Release the strategy and detach from the model
    ///
    /// Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatch.read().strategy.release();
        if let Some(bridge) = self.bridge.lock().take() {
            bridge.detach();
        }
        self.notifier.notify(&OperationNotification::Released);
        tracing::info!("released mock operation [{}]", self.name());
    }

    /// Check if released
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for MockOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockOperation")
            .field("id", &self.id)
            .field("name", &*self.name.read())
            .field("binding", &*self.binding.read())
            .field("responses", &self.store.read().len())
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockops_model::{Project, ResponseTemplate};
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct Failing;

    impl ResponseHandler for Failing {
        fn execute(
            &self,
            _response: &ResponseDefinition,
            _request: &MockRequest,
            _result: &MockResult,
        ) -> Result<(), BoxError> {
            Err("template error".into())
        }
    }

    #[derive(Debug)]
    struct Panicking;

    impl ResponseHandler for Panicking {
        fn execute(
            &self,
            _response: &ResponseDefinition,
            _request: &MockRequest,
            _result: &MockResult,
        ) -> Result<(), BoxError> {
            panic!("handler blew up")
        }
    }

    fn project() -> (Arc<Project>, OperationRef) {
        let project = Arc::new(Project::new("p"));
        let iface = project.add_interface("Port");
        let op = project
            .add_operation(iface, "Get", OperationDirection::RequestResponse)
            .unwrap();
        let reference = OperationRef::new(iface, op);
        project
            .set_response_template(
                reference,
                ResponseTemplate::new("<get/>").with_optional("<extra/>"),
            )
            .unwrap();
        (project, reference)
    }

    fn default_only(names: &[&str]) -> MockOperation {
        let context = OperationContext::new()
            .with_settings(MockSettings::new().with_dispatch_style(DispatchStyle::DefaultOnly));
        let op = MockOperation::new("op", context).unwrap();
        for name in names {
            op.add_response(ResponseDefinition::new(*name, format!("<{name}/>")))
                .unwrap();
        }
        op
    }

    #[test]
    fn empty_store_fails_but_binds_request() {
        let (project, reference) = project();
        let context = OperationContext::new().with_model(project);
        let op = MockOperation::for_operation("op", reference, context).unwrap();

        let mut request = MockRequest::new("");
        let err = op.dispatch(&mut request).unwrap_err();

        assert!(matches!(err, DispatchError::NoResponsesConfigured { .. }));
        assert_eq!(request.operation().unwrap().reference, Some(reference));
    }

    #[test]
    fn unset_default_then_set() {
        let op = default_only(&["A", "B"]);
        op.set_default_response("").unwrap();

        let mut request = MockRequest::new("");
        assert!(matches!(
            op.dispatch(&mut request),
            Err(DispatchError::NoResponseResolved { .. })
        ));

        op.set_default_response("B").unwrap();
        let result = op.dispatch(&mut request).unwrap();
        assert_eq!(result.response_name(), Some("B"));
        assert_eq!(result.output().unwrap().body, "<B/>");
        assert!(result.time_taken().is_some());
    }

    #[test]
    fn removed_default_is_treated_as_none() {
        let op = default_only(&["A", "B"]);
        op.remove_response(0).unwrap();

        assert_eq!(op.default_response_name(), "A");
        assert!(matches!(
            op.dispatch(&mut MockRequest::new("")),
            Err(DispatchError::NoResponseResolved { .. })
        ));
    }

    #[test]
    fn handler_error_becomes_execution_failure() {
        let context = OperationContext::new().with_handler(Arc::new(Failing));
        let op = MockOperation::new("op", context).unwrap();
        op.add_response(ResponseDefinition::new("A", "")).unwrap();

        let err = op.dispatch(&mut MockRequest::new("")).unwrap_err();
        match err {
            DispatchError::ExecutionFailure {
                response, source, ..
            } => {
                assert_eq!(response.as_deref(), Some("A"));
                assert_eq!(source.to_string(), "template error");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn handler_panic_becomes_execution_failure() {
        let context = OperationContext::new().with_handler(Arc::new(Panicking));
        let op = MockOperation::new("op", context).unwrap();
        op.add_response(ResponseDefinition::new("A", "")).unwrap();

        let err = op.dispatch(&mut MockRequest::new("")).unwrap_err();
        assert!(err.to_string().contains("handler blew up"));
    }

    #[test]
    fn set_operation_round_trip() {
        let (project, reference) = project();
        let op = MockOperation::new("op", OperationContext::new().with_model(project)).unwrap();
        let changes = op.subscribe();

        op.set_operation(Some(reference)).unwrap();
        assert_eq!(op.interface_name().as_deref(), Some("Port"));
        assert_eq!(op.operation_name().as_deref(), Some("Get"));

        op.set_operation(None).unwrap();
        assert_eq!(op.binding(), OperationBinding::default());

        assert_eq!(
            changes.try_iter().collect::<Vec<_>>(),
            vec![
                OperationNotification::OperationChanged {
                    old: None,
                    new: Some(reference),
                },
                OperationNotification::OperationChanged {
                    old: Some(reference),
                    new: None,
                },
            ]
        );
    }

    #[test]
    fn new_response_uses_template() {
        let (project, reference) = project();
        let settings = MockSettings::new().with_optional_elements(true);
        let context = OperationContext::new()
            .with_model(project)
            .with_settings(settings);
        let op = MockOperation::for_operation("op", reference, context).unwrap();

        op.new_response("generated", true).unwrap();
        op.new_response("blank", false).unwrap();

        assert_eq!(
            op.response_by_name("generated").unwrap().content,
            "<get/>\n<extra/>"
        );
        assert_eq!(op.response_by_name("blank").unwrap().content, "");
        assert!(op.is_bidirectional());
        assert!(!op.is_one_way());
    }

    #[test]
    fn unresolved_binding_counts_as_bidirectional() {
        let op = default_only(&["A"]);
        assert!(!op.is_unidirectional());
        assert!(op.is_bidirectional());
        assert!(!op.is_one_way());
    }

    #[test]
    fn rename_default_notifies() {
        let op = default_only(&["A", "B"]);
        let changes = op.subscribe();
        op.rename_response("A", "Z").unwrap();

        assert_eq!(op.default_response_name(), "Z");
        assert_eq!(
            changes.try_iter().collect::<Vec<_>>(),
            vec![
                OperationNotification::ResponseRenamed {
                    old: "A".into(),
                    new: "Z".into(),
                },
                OperationNotification::DefaultChanged {
                    old: "A".into(),
                    new: "Z".into(),
                },
            ]
        );
    }

    #[test]
    fn from_config_keeps_unresolved_names() {
        let (project, _) = project();
        let config = MockOperationConfig::new("op", "Missing", "Get")
            .with_response(ResponseDefinition::new("A", ""));
        let op = MockOperation::from_config(&config, OperationContext::new().with_model(project))
            .unwrap();

        assert!(!op.binding().is_resolved());
        assert_eq!(op.interface_name().as_deref(), Some("Missing"));
        assert_eq!(op.to_config().interface.as_deref(), Some("Missing"));
        assert_eq!(op.bridge_state(), BridgeState::Attached);
    }

    #[test]
    fn from_config_without_default_stays_unset() {
        let (project, _) = project();
        let config = MockOperationConfig::new("op", "Port", "Get")
            .with_response(ResponseDefinition::new("A", "<a/>"))
            .with_response(ResponseDefinition::new("B", "<b/>"))
            .with_dispatch(DispatchConfig::style(DispatchStyle::DefaultOnly));
        let op = MockOperation::from_config(&config, OperationContext::new().with_model(project))
            .unwrap();

        assert_eq!(op.default_response_name(), "");
        assert_eq!(op.to_config().default_response, None);
        assert!(matches!(
            op.dispatch(&mut MockRequest::new("")),
            Err(DispatchError::NoResponseResolved { .. })
        ));
    }

    #[test]
    fn to_config_round_trip() {
        let (project, _) = project();
        let config = MockOperationConfig::new("op", "Port", "Get")
            .with_response(ResponseDefinition::new("A", "<a/>"))
            .with_response(ResponseDefinition::new("B", "<b/>").with_status(500))
            .with_default("B")
            .with_dispatch(DispatchConfig::style(DispatchStyle::Random));
        let op = MockOperation::from_config(&config, OperationContext::new().with_model(project))
            .unwrap();

        assert!(op.binding().is_resolved());
        assert_eq!(op.to_config(), config);
    }

    #[test]
    fn release_is_idempotent() {
        let (project, reference) = project();
        let op = MockOperation::for_operation(
            "op",
            reference,
            OperationContext::new().with_model(project.clone()),
        )
        .unwrap();
        let changes = op.subscribe();

        op.release();
        op.release();

        assert!(op.is_released());
        assert_eq!(op.bridge_state(), BridgeState::Detached);
        assert_eq!(project.events().listener_count(), 0);
        assert_eq!(
            changes.try_iter().collect::<Vec<_>>(),
            vec![OperationNotification::Released]
        );
    }

    #[test]
    fn dispatch_config_swap() {
        let op = default_only(&["A"]);
        op.set_dispatch_config(DispatchConfig::style(DispatchStyle::Sequence))
            .unwrap();
        assert_eq!(op.dispatch_style(), DispatchStyle::Sequence);

        let bad = DispatchConfig::script("", None);
        assert!(op.set_dispatch_config(bad).is_err());
        assert_eq!(op.dispatch_style(), DispatchStyle::Sequence);
    }
}
