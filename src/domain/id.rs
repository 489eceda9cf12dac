//! IR identifier types with the NewType pattern
//!
//! Resource keys, entity names and source locations are all strings in the
//! ingested configuration. Wrapping them keeps a mapping's `rkey` from being
//! passed where its `location` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate NewType string wrappers with the common traits
macro_rules! ir_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from anything string-like
            pub fn new<S: Into<String>>(value: S) -> Self {
                Self(value.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is the empty string
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

ir_id!(
    /// Resource key: the ingestion identity shared by everything derived from one record
    ResourceKey
);

ir_id!(
    /// Name of an IR entity (module, TLS context, mapping, filter)
    EntityName
);

ir_id!(
    /// Source location of a record, e.g. `ambassador.yaml.1`
    Location
);
