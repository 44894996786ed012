//! Change notifications
//!
//! Live objects publish what changed to any number of subscribers over
//! unbounded channels. Subscribers that dropped their receiver are pruned on
//! the next send.

use crossbeam::channel::{unbounded, Receiver, Sender};
use mockops_model::OperationRef;
use parking_lot::Mutex;

/// Changes to one mock operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationNotification {
    /// Bound operation changed (`new: None` means unbound)
    OperationChanged {
        /// Previous binding
        old: Option<OperationRef>,
        /// Current binding
        new: Option<OperationRef>,
    },
    /// A response was added
    ResponseAdded {
        /// Response name
        name: String,
    },
    /// A response was removed
    ResponseRemoved {
        /// Response name
        name: String,
    },
    /// A response was renamed
    ResponseRenamed {
        /// Name before
        old: String,
        /// Name after
        new: String,
    },
    /// The default response designation changed
    DefaultChanged {
        /// Previous default name
        old: String,
        /// Current default name
        new: String,
    },
    /// The operation was released
    Released,
}

/// Changes to a mock service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceNotification {
    /// A mock operation was added
    OperationAdded {
        /// Mock operation name
        name: String,
    },
    /// A mock operation was removed
    OperationRemoved {
        /// Mock operation name
        name: String,
    },
    /// A response was added to one of the service's operations
    ResponseAdded {
        /// Mock operation name
        operation: String,
        /// Response name
        response: String,
    },
}

/// Fan-out of notifications to channel subscribers
#[derive(Debug)]
pub struct Notifier<T> {
    senders: Mutex<Vec<Sender<T>>>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Notifier<T> {
    /// Create notifier without subscribers
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.senders.lock().push(tx);
        rx
    }

    /// Send to every live subscriber
    pub fn notify(&self, value: &T) {
        self.senders
            .lock()
            .retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last send)
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.senders.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_out_and_prune() {
        let notifier = Notifier::new();
        let a = notifier.subscribe();
        let b = notifier.subscribe();
        drop(b);

        notifier.notify(&OperationNotification::Released);

        assert_eq!(a.try_recv(), Ok(OperationNotification::Released));
        assert_eq!(notifier.subscriber_count(), 1);
    }
}
