//! Stable identifiers
//!
//! Model entities are compared by id, never by display name: an interface
//! that is removed and re-created under the same name is a different entity.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a new id
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(
    /// Identity of an interface in the live model
    InterfaceId
);

ulid_id!(
    /// Identity of an operation in the live model
    OperationId
);

ulid_id!(
    /// Handle returned by [`crate::EventBus::subscribe`]
    SubscriptionId
);
