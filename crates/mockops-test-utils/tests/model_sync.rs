//! Functional tests for keeping mock operations in step with the model.
//!
//! Covers the bridge between a live project and the mock operations bound
//! to it: renames rewrite names, removals ask the owner to drop the mock
//! operation exactly once, and unrelated changes are ignored.

use mockops_dispatch::{
    BridgeState, MockService, MockSettings, OperationNotification, ServiceNotification,
    ServiceParts,
};
use mockops_model::{OperationDirection, OperationRef, ServiceModel};
use mockops_test_utils::{owned_operation, sample_project, RecordingOwner, INTERFACE, ONE_WAY};
use pretty_assertions::assert_eq;

/// Tenet: removing the bound interface requests exactly one removal.
#[test]
fn interface_removal_requests_one_removal() {
    let sample = sample_project();
    let owner = RecordingOwner::new();
    let op = owned_operation(&sample, &owner);
    assert_eq!(op.bridge_state(), BridgeState::Attached);

    sample
        .project
        .remove_interface(sample.get_invoice.interface)
        .unwrap();

    assert_eq!(owner.removals(), vec![op.id()]);
}

/// Tenet: an operation rebound after a declined removal is tracked afresh.
#[test]
fn rebound_operation_removal_is_requested_again() {
    let sample = sample_project();
    let owner = RecordingOwner::new();
    let op = owned_operation(&sample, &owner);

    sample
        .project
        .remove_interface(sample.get_invoice.interface)
        .unwrap();
    assert_eq!(owner.removals().len(), 1);

    let other = sample.project.add_interface("Other");
    let x = sample
        .project
        .add_operation(other, "X", OperationDirection::OneWay)
        .unwrap();
    op.set_operation(Some(OperationRef::new(other, x))).unwrap();
    sample.project.remove_interface(other).unwrap();

    assert_eq!(owner.removals(), vec![op.id(), op.id()]);
}

/// Tenet: changes to other interfaces are not this operation's business.
#[test]
fn unrelated_interface_removal_is_ignored() {
    let sample = sample_project();
    let owner = RecordingOwner::new();
    let op = owned_operation(&sample, &owner);

    let other = sample.project.add_interface("AuditPort");
    sample.project.remove_interface(other).unwrap();

    assert!(owner.removals().is_empty());
    assert_eq!(op.interface_name().as_deref(), Some(INTERFACE));
}

/// Tenet: renames flow into the persisted names without touching identity.
#[test]
fn renames_update_binding_names() {
    let sample = sample_project();
    let owner = RecordingOwner::new();
    let op = owned_operation(&sample, &owner);

    sample
        .project
        .rename_interface(sample.get_invoice.interface, "InvoicePort")
        .unwrap();
    sample
        .project
        .rename_operation(sample.get_invoice, "FetchInvoice")
        .unwrap();

    let binding = op.binding();
    assert_eq!(binding.reference, Some(sample.get_invoice));
    assert_eq!(binding.interface_name.as_deref(), Some("InvoicePort"));
    assert_eq!(binding.operation_name.as_deref(), Some("FetchInvoice"));
    assert!(owner.removals().is_empty());
}

/// Tenet: set_operation(ref) reads back the ref's names; None clears them.
#[test]
fn set_operation_round_trip() {
    let sample = sample_project();
    let owner = RecordingOwner::new();
    let op = owned_operation(&sample, &owner);
    let changes = op.subscribe();

    op.set_operation(Some(sample.post_payment)).unwrap();
    assert_eq!(op.interface_name().as_deref(), Some(INTERFACE));
    assert_eq!(op.operation_name().as_deref(), Some(ONE_WAY));
    assert!(op.is_one_way());

    op.set_operation(None).unwrap();
    assert_eq!(op.interface_name(), None);
    assert_eq!(op.operation_name(), None);

    assert_eq!(
        changes.try_recv().unwrap(),
        OperationNotification::OperationChanged {
            old: Some(sample.get_invoice),
            new: Some(sample.post_payment),
        }
    );
    assert_eq!(
        changes.try_recv().unwrap(),
        OperationNotification::OperationChanged {
            old: Some(sample.post_payment),
            new: None,
        }
    );
}

/// Tenet: a service drops and releases the mock operation when its model
/// operation goes away, and stops listening for it.
#[test]
fn service_drops_operation_on_model_removal() {
    let sample = sample_project();
    let service = MockService::new(
        "billing",
        sample.project.clone(),
        MockSettings::default(),
        ServiceParts::default(),
    );
    let events = service.subscribe();
    let op = service
        .add_operation_for("GetInvoice Mock", sample.get_invoice)
        .unwrap();
    let listeners = sample.project.events().listener_count();

    sample.project.remove_operation(sample.get_invoice).unwrap();

    assert_eq!(service.operation_count(), 0);
    assert!(op.is_released());
    assert_eq!(op.bridge_state(), BridgeState::Detached);
    assert_eq!(sample.project.events().listener_count(), listeners - 1);

    let removed: Vec<_> = events
        .try_iter()
        .filter(|e| matches!(e, ServiceNotification::OperationRemoved { .. }))
        .collect();
    assert_eq!(removed.len(), 1);
}

/// Tenet: a recreated interface with the same name is a different entity.
#[test]
fn same_name_interface_is_not_the_bound_one() {
    let sample = sample_project();
    let owner = RecordingOwner::new();
    let op = owned_operation(&sample, &owner);

    let twin = sample.project.add_interface(INTERFACE);
    let twin_op = sample
        .project
        .add_operation(twin, "GetInvoice", OperationDirection::RequestResponse)
        .unwrap();
    sample
        .project
        .remove_operation(OperationRef::new(twin, twin_op))
        .unwrap();
    sample.project.remove_interface(twin).unwrap();

    assert!(owner.removals().is_empty());
    assert_eq!(op.binding().reference, Some(sample.get_invoice));
}
