//! Identifier newtypes.
//!
//! Persisted identifiers ([`ClaimId`], [`MediaId`]) are assigned by the
//! backend and may be numeric or string-shaped depending on the table; both
//! are carried as trimmed, non-empty strings. [`StagedId`] identifies an
//! upload that exists only in a pending edit and is generated locally from a
//! v4 UUID, which keeps it unique within the edit and disjoint from every
//! persisted identifier.

use crate::{TypesError, TypesResult};

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given input.
            ///
            /// The input is trimmed of leading and trailing whitespace. If the
            /// trimmed result is empty, an error is returned.
            ///
            /// # Errors
            ///
            /// Returns `TypesError::EmptyIdentifier` for empty or
            /// whitespace-only input.
            pub fn new(input: impl AsRef<str>) -> TypesResult<Self> {
                let trimmed = input.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(TypesError::EmptyIdentifier);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

opaque_id! {
    /// Identifier of a persisted claim record, assigned by the backend.
    ClaimId
}

opaque_id! {
    /// Identifier of a persisted media record, assigned by the backend.
    MediaId
}

opaque_id! {
    /// Identifier of the user issuing an update, required by the backend on
    /// every combined-update call.
    EditorId
}

/// Identifier of a staged upload inside one pending edit.
///
/// Generated locally, never persisted, never sent to the backend. The value
/// is a v4 UUID in simple (32 lowercase hex) form, so two staged uploads in
/// the same edit cannot share an identifier and no staged identifier can
/// collide with a backend-assigned [`MediaId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagedId(String);

impl StagedId {
    /// Generates a fresh staged-upload identifier.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StagedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
