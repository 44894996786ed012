//! Live interface/operation model
//!
//! [`Project`] is the in-memory model mock operations bind to. Every
//! identity-changing mutation publishes a [`ModelEvent`] after the model lock
//! is released.

use crate::error::ModelError;
use crate::events::{EventBus, ModelEvent};
use crate::ids::{InterfaceId, OperationId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Message exchange pattern of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationDirection {
    /// Request in, response out
    #[default]
    RequestResponse,

    /// Request in, nothing out
    OneWay,

    /// Nothing in, message out
    Notification,

    /// Message out, response in
    SolicitResponse,
}

impl OperationDirection {
    /// Exchange carries a single message
    #[inline]
    #[must_use]
    pub fn is_unidirectional(self) -> bool {
        matches!(self, Self::OneWay | Self::Notification)
    }

    /// Exchange carries a message each way
    #[inline]
    #[must_use]
    pub fn is_bidirectional(self) -> bool {
        !self.is_unidirectional()
    }
}

/// Skeleton used to seed new response content for an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTemplate {
    /// Body containing the required elements
    pub skeleton: String,

    /// Optional elements appended on request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_parts: Vec<String>,
}

impl ResponseTemplate {
    /// Create template with required skeleton only
    #[inline]
    #[must_use]
    pub fn new(skeleton: impl Into<String>) -> Self {
        Self {
            skeleton: skeleton.into(),
            optional_parts: Vec::new(),
        }
    }

    /// Add an optional element
    #[inline]
    #[must_use]
    pub fn with_optional(mut self, part: impl Into<String>) -> Self {
        self.optional_parts.push(part.into());
        self
    }

    /// Render the template
    #[must_use]
    pub fn render(&self, include_optional: bool) -> String {
        if !include_optional || self.optional_parts.is_empty() {
            return self.skeleton.clone();
        }
        let mut out = self.skeleton.clone();
        for part in &self.optional_parts {
            out.push('\n');
            out.push_str(part);
        }
        out
    }
}

/// Identity-based reference to one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationRef {
    /// Owning interface
    pub interface: InterfaceId,
    /// Operation within that interface
    pub operation: OperationId,
}

impl OperationRef {
    /// Create reference
    #[inline]
    #[must_use]
    pub fn new(interface: InterfaceId, operation: OperationId) -> Self {
        Self {
            interface,
            operation,
        }
    }
}

/// Snapshot of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Identity
    pub id: OperationId,
    /// Owning interface
    pub interface: InterfaceId,
    /// Display name
    pub name: String,
    /// Exchange pattern
    pub direction: OperationDirection,
    /// Response content skeleton, if the operation has a response
    pub response_template: Option<ResponseTemplate>,
}

impl Operation {
    /// Reference to this operation
    #[inline]
    #[must_use]
    pub fn reference(&self) -> OperationRef {
        OperationRef::new(self.interface, self.id)
    }
}

/// Snapshot of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Identity
    pub id: InterfaceId,
    /// Display name
    pub name: String,
    /// Operations in declaration order
    pub operations: Vec<Operation>,
}

impl Interface {
    /// First operation with this name
    #[must_use]
    pub fn operation_by_name(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

/// Read side of the model that mock operations depend on
pub trait ServiceModel: Send + Sync {
    /// Resolve an (interface name, operation name) pair
    ///
    /// # Errors
    /// - `ModelError::MissingInterface` if no interface has that name
    /// - `ModelError::MissingOperation` if the interface lacks the operation
    fn resolve(&self, interface: &str, operation: &str) -> Result<OperationRef, ModelError>;

    /// Snapshot of a referenced operation
    fn operation(&self, reference: OperationRef) -> Option<Operation>;

    /// Snapshot of an interface
    fn interface(&self, id: InterfaceId) -> Option<Interface>;

    /// Lifecycle events of this model
    fn events(&self) -> &EventBus;
}

/// In-memory project model
#[derive(Debug)]
pub struct Project {
    name: String,
    interfaces: RwLock<Vec<Interface>>,
    events: EventBus,
}

impl Project {
    /// Create empty project
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: RwLock::new(Vec::new()),
            events: EventBus::new(),
        }
    }

    /// Project name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an interface
    pub fn add_interface(&self, name: impl Into<String>) -> InterfaceId {
        let id = InterfaceId::new();
        self.interfaces.write().push(Interface {
            id,
            name: name.into(),
            operations: Vec::new(),
        });
        id
    }

    /// Add an operation to an interface
    ///
    /// # Errors
    /// `ModelError::UnknownInterface` if the interface is not in the model
    pub fn add_operation(
        &self,
        interface: InterfaceId,
        name: impl Into<String>,
        direction: OperationDirection,
    ) -> Result<OperationId, ModelError> {
        let mut guard = self.interfaces.write();
        let iface = guard
            .iter_mut()
            .find(|i| i.id == interface)
            .ok_or(ModelError::UnknownInterface(interface))?;

        let id = OperationId::new();
        iface.operations.push(Operation {
            id,
            interface,
            name: name.into(),
            direction,
            response_template: None,
        });
        Ok(id)
    }

    /// Attach a response template to an operation
    ///
    /// # Errors
    /// `ModelError::UnknownOperation` if the reference does not resolve
    pub fn set_response_template(
        &self,
        reference: OperationRef,
        template: ResponseTemplate,
    ) -> Result<(), ModelError> {
        let mut guard = self.interfaces.write();
        let op = find_operation_mut(&mut guard, reference)?;
        op.response_template = Some(template);
        Ok(())
    }

    /// Rename an interface
    ///
    /// # Errors
    /// `ModelError::UnknownInterface` if the interface is not in the model
    pub fn rename_interface(
        &self,
        interface: InterfaceId,
        new_name: impl Into<String>,
    ) -> Result<(), ModelError> {
        let new_name = new_name.into();
        let old_name = {
            let mut guard = self.interfaces.write();
            let iface = guard
                .iter_mut()
                .find(|i| i.id == interface)
                .ok_or(ModelError::UnknownInterface(interface))?;
            std::mem::replace(&mut iface.name, new_name.clone())
        };

        tracing::info!("interface [{}] renamed to [{}]", old_name, new_name);
        self.events.publish(&ModelEvent::InterfaceRenamed {
            interface,
            old_name,
            new_name,
        });
        Ok(())
    }

    /// Remove an interface with all its operations
    ///
    /// # Errors
    /// `ModelError::UnknownInterface` if the interface is not in the model
    pub fn remove_interface(&self, interface: InterfaceId) -> Result<(), ModelError> {
        let removed = {
            let mut guard = self.interfaces.write();
            let idx = guard
                .iter()
                .position(|i| i.id == interface)
                .ok_or(ModelError::UnknownInterface(interface))?;
            guard.remove(idx)
        };

        tracing::info!("interface [{}] removed", removed.name);
        self.events
            .publish(&ModelEvent::InterfaceRemoved { interface });
        Ok(())
    }

    /// Rename an operation
    ///
    /// # Errors
    /// `ModelError::UnknownOperation` if the reference does not resolve
    pub fn rename_operation(
        &self,
        reference: OperationRef,
        new_name: impl Into<String>,
    ) -> Result<(), ModelError> {
        let new_name = new_name.into();
        let old_name = {
            let mut guard = self.interfaces.write();
            let op = find_operation_mut(&mut guard, reference)?;
            std::mem::replace(&mut op.name, new_name.clone())
        };

        tracing::info!("operation [{}] renamed to [{}]", old_name, new_name);
        self.events.publish(&ModelEvent::OperationRenamed {
            interface: reference.interface,
            operation: reference.operation,
            old_name,
            new_name,
        });
        Ok(())
    }

    /// Remove an operation
    ///
    /// # Errors
    /// `ModelError::UnknownOperation` if the reference does not resolve
    pub fn remove_operation(&self, reference: OperationRef) -> Result<(), ModelError> {
        let removed = {
            let mut guard = self.interfaces.write();
            let iface = guard
                .iter_mut()
                .find(|i| i.id == reference.interface)
                .ok_or(ModelError::UnknownOperation(reference.operation))?;
            let idx = iface
                .operations
                .iter()
                .position(|op| op.id == reference.operation)
                .ok_or(ModelError::UnknownOperation(reference.operation))?;
            iface.operations.remove(idx)
        };

        tracing::info!("operation [{}] removed", removed.name);
        self.events.publish(&ModelEvent::OperationRemoved {
            interface: reference.interface,
            operation: reference.operation,
        });
        Ok(())
    }

    /// First interface with this name
    #[must_use]
    pub fn interface_by_name(&self, name: &str) -> Option<Interface> {
        self.interfaces
            .read()
            .iter()
            .find(|i| i.name == name)
            .cloned()
    }

    /// All interfaces in insertion order
    #[must_use]
    pub fn interfaces(&self) -> Vec<Interface> {
        self.interfaces.read().clone()
    }
}

impl ServiceModel for Project {
    fn resolve(&self, interface: &str, operation: &str) -> Result<OperationRef, ModelError> {
        let guard = self.interfaces.read();
        let iface = guard
            .iter()
            .find(|i| i.name == interface)
            .ok_or_else(|| ModelError::MissingInterface(interface.to_string()))?;
        iface
            .operation_by_name(operation)
            .map(Operation::reference)
            .ok_or_else(|| ModelError::MissingOperation {
                interface: interface.to_string(),
                operation: operation.to_string(),
            })
    }

    fn operation(&self, reference: OperationRef) -> Option<Operation> {
        self.interfaces
            .read()
            .iter()
            .find(|i| i.id == reference.interface)
            .and_then(|i| i.operations.iter().find(|op| op.id == reference.operation))
            .cloned()
    }

    fn interface(&self, id: InterfaceId) -> Option<Interface> {
        self.interfaces.read().iter().find(|i| i.id == id).cloned()
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}

fn find_operation_mut(
    interfaces: &mut [Interface],
    reference: OperationRef,
) -> Result<&mut Operation, ModelError> {
    interfaces
        .iter_mut()
        .find(|i| i.id == reference.interface)
        .and_then(|i| {
            i.operations
                .iter_mut()
                .find(|op| op.id == reference.operation)
        })
        .ok_or(ModelError::UnknownOperation(reference.operation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ModelListener;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ModelEvent>>,
    }

    impl ModelListener for Recorder {
        fn on_model_event(&self, event: &ModelEvent) {
            self.seen.lock().push(event.clone());
        }
    }

    fn sample() -> (Project, OperationRef) {
        let project = Project::new("p");
        let iface = project.add_interface("Port");
        let op = project
            .add_operation(iface, "Get", OperationDirection::RequestResponse)
            .unwrap();
        (project, OperationRef::new(iface, op))
    }

    #[test]
    fn resolve_by_names() {
        let (project, reference) = sample();
        assert_eq!(project.resolve("Port", "Get").unwrap(), reference);
    }

    #[test]
    fn resolve_distinguishes_missing_interface_and_operation() {
        let (project, _) = sample();
        assert_eq!(
            project.resolve("Nope", "Get"),
            Err(ModelError::MissingInterface("Nope".into()))
        );
        assert!(matches!(
            project.resolve("Port", "Nope"),
            Err(ModelError::MissingOperation { .. })
        ));
    }

    #[test]
    fn rename_operation_publishes_event() {
        let (project, reference) = sample();
        let rec = Arc::new(Recorder::default());
        project.events().subscribe(rec.clone());

        project.rename_operation(reference, "Fetch").unwrap();

        assert_eq!(project.operation(reference).unwrap().name, "Fetch");
        assert_eq!(
            rec.seen.lock().as_slice(),
            &[ModelEvent::OperationRenamed {
                interface: reference.interface,
                operation: reference.operation,
                old_name: "Get".into(),
                new_name: "Fetch".into(),
            }]
        );
    }

    #[test]
    fn remove_interface_drops_operations() {
        let (project, reference) = sample();
        project.remove_interface(reference.interface).unwrap();

        assert!(project.operation(reference).is_none());
        assert!(project.interface(reference.interface).is_none());
        assert_eq!(
            project.remove_interface(reference.interface),
            Err(ModelError::UnknownInterface(reference.interface))
        );
    }

    #[test]
    fn recreated_interface_has_new_identity() {
        let (project, reference) = sample();
        project.remove_interface(reference.interface).unwrap();
        let again = project.add_interface("Port");
        assert_ne!(again, reference.interface);
    }

    #[test]
    fn template_render_optional() {
        let t = ResponseTemplate::new("<a/>").with_optional("<b/>");
        assert_eq!(t.render(false), "<a/>");
        assert_eq!(t.render(true), "<a/>\n<b/>");
    }

    #[test]
    fn direction_classification() {
        assert!(OperationDirection::OneWay.is_unidirectional());
        assert!(OperationDirection::Notification.is_unidirectional());
        assert!(OperationDirection::RequestResponse.is_bidirectional());
        assert!(OperationDirection::SolicitResponse.is_bidirectional());
    }
}
