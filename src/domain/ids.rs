//! Pattern-constrained identifier newtypes for the four aggregate roots.
//!
//! Identifiers are caller-supplied, not generated: `T-` for tasks, `P-`
//! for projects, `S-` for sprints, and `L-` for action lists, followed by
//! a non-empty suffix of ASCII alphanumerics, `-`, or `_`, at most
//! [`MAX_ID_LEN`] characters in total. Collisions surface as `Conflict`
//! from the repository, never here.

use super::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted identifier length, including the prefix.
pub const MAX_ID_LEN: usize = 64;

fn validate_id(raw: &str, prefix: &str, entity: &str) -> DomainResult<()> {
    let Some(suffix) = raw.strip_prefix(prefix) else {
        return Err(DomainError::validation(format!(
            "{entity} id '{raw}' must start with '{prefix}'"
        )));
    };
    if suffix.is_empty() {
        return Err(DomainError::validation(format!(
            "{entity} id '{raw}' must have a non-empty suffix after '{prefix}'"
        )));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(DomainError::validation(format!(
            "{entity} id '{raw}' exceeds {MAX_ID_LEN} characters"
        )));
    }
    if let Some(bad) = suffix
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
    {
        return Err(DomainError::validation(format!(
            "{entity} id '{raw}' contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal, $entity:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Required identifier prefix.
            pub const PREFIX: &'static str = $prefix;

            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns a `Validation` error when the value does not match
            /// the required prefix pattern.
            pub fn new(value: impl Into<String>) -> DomainResult<Self> {
                let raw = value.into();
                validate_id(&raw, $prefix, $entity)?;
                Ok(Self(raw))
            }

            /// Returns the identifier as `str`.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a task (`T-` prefix).
    TaskId,
    "T-",
    "task"
);

entity_id!(
    /// Unique identifier for a project (`P-` prefix).
    ProjectId,
    "P-",
    "project"
);

entity_id!(
    /// Unique identifier for a sprint (`S-` prefix).
    SprintId,
    "S-",
    "sprint"
);

entity_id!(
    /// Unique identifier for an action list (`L-` prefix).
    ActionListId,
    "L-",
    "action list"
);
