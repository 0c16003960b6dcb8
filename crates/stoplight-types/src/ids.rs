//! Type-safe identifier wrappers around host-issued strings.
//!
//! The encounter host hands out opaque string identifiers for combatants,
//! actors and tokens. Each gets its own newtype so a token reference can
//! never be passed where a participant id is expected. The tracker never
//! parses or generates these values; it only compares and stores them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(String);

        impl $name {
            /// Wrap a host-issued identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a participant (combatant) in the encounter.
    ParticipantId
}

define_id! {
    /// Opaque reference to the actor document behind a participant.
    ActorRef
}

define_id! {
    /// Opaque reference to the token placed on the scene for a participant.
    TokenRef
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_serializes_as_bare_string() {
        let id = ParticipantId::new("c7Jk2");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"c7Jk2\""));

        let restored: Result<ParticipantId, _> = serde_json::from_str("\"c7Jk2\"");
        assert_eq!(restored.ok(), Some(id));
    }

    #[test]
    fn id_display_matches_inner() {
        let id = TokenRef::from("tok-1");
        assert_eq!(id.to_string(), "tok-1");
        assert_eq!(id.as_str(), "tok-1");
        assert_eq!(id.into_inner(), String::from("tok-1"));
    }

    #[test]
    fn ids_order_lexically() {
        let a = ParticipantId::from("a");
        let b = ParticipantId::from("b");
        assert!(a < b);
    }
}
