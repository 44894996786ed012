//! Model synchronization bridge
//!
//! A [`ModelSyncBridge`] listens to the live model on behalf of one mock
//! operation. Renames rewrite the operation's persisted names; removal of
//! the bound operation or its interface asks the owner to drop the mock
//! operation. Events are matched by identity, never by name.
//!
//! # State machine
//!
//! ```text
//! Attached ──detach()/drop──▶ Detached
//! ```
//!
//! The transition happens exactly once per bridge.

use crate::operation::{MockOperationId, OperationBinding};
use mockops_model::{ModelEvent, ModelListener, OperationRef, ServiceModel, SubscriptionId};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

/// Owner of mock operations (usually a [`crate::MockService`])
#[cfg_attr(test, mockall::automock)]
pub trait OperationOwner: Send + Sync {
    /// Remove a mock operation
    ///
    /// # Returns
    /// `true` if the operation was owned and has been removed
    fn remove_mock_operation(&self, id: MockOperationId) -> bool;

    /// A response was added to one of the owned operations
    fn response_added(&self, _operation: &str, _response: &str) {}
}

/// Bridge subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Listening to model events
    Attached,
    /// Unsubscribed
    Detached,
}

struct BridgeListener {
    operation: MockOperationId,
    binding: Weak<RwLock<OperationBinding>>,
    owner: Weak<dyn OperationOwner>,
    /// Binding the last removal request was made for
    removal_requested: Mutex<Option<OperationRef>>,
}

impl BridgeListener {
    /// Ask the owner once per bound reference
    fn request_removal(&self, reference: OperationRef) {
        if self.removal_requested.lock().replace(reference) == Some(reference) {
            return;
        }
        match self.owner.upgrade() {
            Some(owner) => {
                let removed = owner.remove_mock_operation(self.operation);
                tracing::info!(
                    "bound operation gone, mock operation {} removed: {}",
                    self.operation,
                    removed
                );
            }
            None => tracing::debug!(
                "bound operation gone but mock operation {} has no owner",
                self.operation
            ),
        }
    }
}

impl ModelListener for BridgeListener {
    fn on_model_event(&self, event: &ModelEvent) {
        let Some(binding) = self.binding.upgrade() else {
            return;
        };

        // Decide under the lock, call the owner after releasing it.
        let (remove, reference) = {
            let mut guard = binding.write();
            let Some(reference) = guard.reference else {
                return;
            };
            let remove = match event {
                ModelEvent::OperationRenamed {
                    interface,
                    operation,
                    new_name,
                    ..
                } if *interface == reference.interface && *operation == reference.operation => {
                    guard.operation_name = Some(new_name.clone());
                    false
                }
                ModelEvent::InterfaceRenamed {
                    interface,
                    new_name,
                    ..
                } if *interface == reference.interface => {
                    guard.interface_name = Some(new_name.clone());
                    false
                }
                ModelEvent::OperationRemoved {
                    interface,
                    operation,
                } => *interface == reference.interface && *operation == reference.operation,
                ModelEvent::InterfaceRemoved { interface } => *interface == reference.interface,
                _ => false,
            };
            (remove, reference)
        };

        if remove {
            drop(binding);
            self.request_removal(reference);
        }
    }
}

/// Subscription of one mock operation to the live model
pub struct ModelSyncBridge {
    model: Arc<dyn ServiceModel>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl ModelSyncBridge {
    /// Subscribe to `model` on behalf of a mock operation
    ///
    /// # Arguments
    /// * `model` - Live model to listen to
    /// * `operation` - Id of the mock operation, passed to the owner on removal
    /// * `binding` - Binding whose names are kept in sync
    /// * `owner` - Owner asked to remove the operation
    #[must_use]
    pub fn attach(
        model: Arc<dyn ServiceModel>,
        operation: MockOperationId,
        binding: Weak<RwLock<OperationBinding>>,
        owner: Weak<dyn OperationOwner>,
    ) -> Self {
        let listener = Arc::new(BridgeListener {
            operation,
            binding,
            owner,
            removal_requested: Mutex::new(None),
        });
        let id = model.events().subscribe(listener);
        tracing::debug!("mock operation {} attached to model ({})", operation, id);
        Self {
            model,
            subscription: Mutex::new(Some(id)),
        }
    }

    /// Unsubscribe from the model
    ///
    /// # Returns
    /// `true` on the first call only
    pub fn detach(&self) -> bool {
        let Some(id) = self.subscription.lock().take() else {
            return false;
        };
        self.model.events().unsubscribe(id);
        tracing::debug!("model subscription {} detached", id);
        true
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> BridgeState {
        if self.subscription.lock().is_some() {
            BridgeState::Attached
        } else {
            BridgeState::Detached
        }
    }
}

impl Drop for ModelSyncBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for ModelSyncBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSyncBridge")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
