//! Type-safe identifier wrappers.
//!
//! Entities, objects, and controllers are identified by globally unique
//! strings chosen at spawn time (the wire format carries them verbatim, and
//! movement tie-breaking orders them lexicographically). Leases are issued
//! by the server and use UUID v7 (time-ordered) so grant order is reflected
//! in the identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_string_id! {
    /// Unique identifier for an entity on the grid.
    ///
    /// Ordering is lexicographic; the movement resolver relies on it for
    /// deterministic tie-breaking.
    EntityId
}

define_string_id! {
    /// Unique identifier for a world object (bush, chest, marker, ...).
    ObjectId
}

define_string_id! {
    /// Identifier of an external controller process holding leases.
    ControllerId
}

/// Unique identifier for a controller lease.
///
/// Issued server-side as UUID v7 so lease ids sort by grant time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub Uuid);

impl LeaseId {
    /// Issue a fresh lease identifier (UUID v7, time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for LeaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for LeaseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for LeaseId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<LeaseId> for Uuid {
    fn from(id: LeaseId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_order_lexicographically() {
        let a = EntityId::new("agent-a");
        let b = EntityId::new("agent-b");
        assert!(a < b);
    }

    #[test]
    fn string_id_roundtrip_serde() {
        let original = EntityId::new("walker-1");
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("\"walker-1\""));
        let restored: Result<EntityId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn lease_id_display_matches_uuid() {
        let id = LeaseId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn lease_ids_sort_by_issue_order() {
        let first = LeaseId::new();
        let second = LeaseId::new();
        // UUID v7 embeds a timestamp, so later grants sort after earlier ones.
        assert!(first <= second);
    }
}
