// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

pub const CRATE_NAME: &str = "civireg-core";

/// Error taxonomy shared by every civireg crate.
///
/// Validation is malformed input, NotFound a dangling reference, Conflict an
/// invariant violation the caller must resolve and resubmit. None of these are
/// retried anywhere in the core; retry policy belongs to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    Validation {
        message: String,
        field: Option<String>,
    },
    NotFound {
        entity: &'static str,
        id: String,
    },
    Conflict {
        message: String,
        details: BTreeMap<String, String>,
    },
    Storage(String),
}

impl RegistryError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    #[must_use]
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn conflict_with(message: impl Into<String>, key: &str, value: &str) -> Self {
        let mut details = BTreeMap::new();
        details.insert(key.to_string(), value.to_string());
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message, field } => match field {
                Some(field) => write!(f, "{field}: {message}"),
                None => f.write_str(message),
            },
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { message, .. } => f.write_str(message),
            Self::Storage(message) => write!(f, "storage error: {message}"),
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
        }
    }
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(
            RegistryError::validation("bad").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RegistryError::not_found("resident", "r-1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(RegistryError::conflict("taken").kind(), ErrorKind::Conflict);
        assert_eq!(RegistryError::storage("io").kind(), ErrorKind::Storage);
    }

    #[test]
    fn display_includes_field_and_id() {
        let err = RegistryError::validation_field("relationship", "unknown label");
        assert_eq!(err.to_string(), "relationship: unknown label");
        let err = RegistryError::not_found("household", "h-7");
        assert_eq!(err.to_string(), "household not found: h-7");
    }

    #[test]
    fn conflict_details_are_carried() {
        let err = RegistryError::conflict_with("household number taken", "household_number", "042");
        match err {
            RegistryError::Conflict { details, .. } => {
                assert_eq!(details.get("household_number").map(String::as_str), Some("042"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
