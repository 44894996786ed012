//! Model lifecycle events
//!
//! The model publishes a closed set of [`ModelEvent`]s. Listeners register a
//! single callback and switch on the event kind.

use crate::ids::{InterfaceId, OperationId, SubscriptionId};
use dashmap::DashMap;
use std::sync::Arc;

/// Identity-changing transitions of the live model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// An operation was renamed
    OperationRenamed {
        /// Interface owning the operation
        interface: InterfaceId,
        /// Renamed operation
        operation: OperationId,
        /// Name before the rename
        old_name: String,
        /// Name after the rename
        new_name: String,
    },

    /// An operation was removed from its interface
    OperationRemoved {
        /// Interface that owned the operation
        interface: InterfaceId,
        /// Removed operation
        operation: OperationId,
    },

    /// An interface was renamed
    InterfaceRenamed {
        /// Renamed interface
        interface: InterfaceId,
        /// Name before the rename
        old_name: String,
        /// Name after the rename
        new_name: String,
    },

    /// An interface (and all its operations) was removed
    InterfaceRemoved {
        /// Removed interface
        interface: InterfaceId,
    },
}

impl ModelEvent {
    /// Interface the event concerns
    #[inline]
    #[must_use]
    pub fn interface(&self) -> InterfaceId {
        match self {
            Self::OperationRenamed { interface, .. }
            | Self::OperationRemoved { interface, .. }
            | Self::InterfaceRenamed { interface, .. }
            | Self::InterfaceRemoved { interface } => *interface,
        }
    }

    /// Short event kind label for logs
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OperationRenamed { .. } => "operation_renamed",
            Self::OperationRemoved { .. } => "operation_removed",
            Self::InterfaceRenamed { .. } => "interface_renamed",
            Self::InterfaceRemoved { .. } => "interface_removed",
        }
    }
}

/// Receiver of model events
///
/// Called on whatever thread mutated the model. Implementations must be
/// fast and must tolerate reentrant calls into the bus (unsubscribing from
/// inside the callback is allowed).
pub trait ModelListener: Send + Sync {
    /// Handle one event
    fn on_model_event(&self, event: &ModelEvent);
}

/// Listener registry
#[derive(Default)]
pub struct EventBus {
    listeners: DashMap<SubscriptionId, Arc<dyn ModelListener>>,
}

impl EventBus {
    /// Create empty bus
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&self, listener: Arc<dyn ModelListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners.insert(id, listener);
        tracing::trace!("model listener {} subscribed", id);
        id
    }

    /// Remove a listener
    ///
    /// Returns `false` when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        tracing::trace!("model listener {} unsubscribed (present: {})", id, removed);
        removed
    }

    /// Deliver an event to every listener
    ///
    /// The listener set is snapshotted first so that no map guard is held
    /// while callbacks run.
    pub fn publish(&self, event: &ModelEvent) {
        let snapshot: Vec<Arc<dyn ModelListener>> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        tracing::debug!(
            "publishing {} for interface {} to {} listener(s)",
            event.kind(),
            event.interface(),
            snapshot.len()
        );

        for listener in snapshot {
            listener.on_model_event(event);
        }
    }

    /// Number of registered listeners
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Check if a subscription is still registered
    #[inline]
    #[must_use]
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.listeners.contains_key(&id)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
