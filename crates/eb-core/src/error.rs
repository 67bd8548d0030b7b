//! Error types for the eb-core crate.
//!
//! This module provides [`RegistryError`] for identity and lookup failures
//! against the [`Registry`](crate::Registry), and [`ConfigError`] for
//! configuration loading and validation.

use crate::identity::EntityKind;

/// Errors raised by the registry and by entity construction.
///
/// During a load every variant is fatal: a duplicate or a dangling
/// reference means the dataset is inconsistent and must be discarded.
///
/// # Examples
///
/// ```
/// use eb_core::{EntityKind, RegistryError};
///
/// let error = RegistryError::not_found(EntityKind::Venue, "V9");
/// assert!(error.is_not_found());
/// assert_eq!(error.to_string(), "no Venue with identity 'V9'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An entity with the same derived identity is already registered.
    #[error("duplicate {kind} identity '{identity}'")]
    DuplicateIdentity {
        /// The kind of entity being registered.
        kind: EntityKind,
        /// The colliding identity string.
        identity: String,
    },

    /// A lookup by identity found nothing.
    #[error("no {kind} with identity '{identity}'")]
    NotFound {
        /// The kind of entity that was looked up.
        kind: EntityKind,
        /// The identity string that failed to resolve.
        identity: String,
    },

    /// An entity failed validation before it could be registered.
    #[error("invalid {kind}: {reason}")]
    InvalidEntity {
        /// The kind of entity being constructed.
        kind: EntityKind,
        /// Why the entity is invalid.
        reason: String,
    },
}

impl RegistryError {
    /// Creates a new [`RegistryError::DuplicateIdentity`] error.
    #[inline]
    pub fn duplicate(kind: EntityKind, identity: impl Into<String>) -> Self {
        Self::DuplicateIdentity {
            kind,
            identity: identity.into(),
        }
    }

    /// Creates a new [`RegistryError::NotFound`] error.
    #[inline]
    pub fn not_found(kind: EntityKind, identity: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            identity: identity.into(),
        }
    }

    /// Creates a new [`RegistryError::InvalidEntity`] error.
    #[inline]
    pub fn invalid(kind: EntityKind, reason: impl Into<String>) -> Self {
        Self::InvalidEntity {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns `true` for a duplicate-identity failure.
    #[inline]
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateIdentity { .. })
    }

    /// Returns `true` for a failed lookup.
    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the entity kind the error refers to.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::DuplicateIdentity { kind, .. }
            | Self::NotFound { kind, .. }
            | Self::InvalidEntity { kind, .. } => *kind,
        }
    }
}

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use eb_core::ConfigError;
///
/// let error = ConfigError::InvalidOption {
///     option: "layout.column_width".to_owned(),
///     reason: "must be at least 1".to_owned(),
/// };
/// assert!(error.to_string().contains("column_width"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let error = RegistryError::duplicate(EntityKind::Subject, "accounting__ledgers");
        assert!(error.is_duplicate());
        assert!(!error.is_not_found());
        assert_eq!(
            error.to_string(),
            "duplicate Subject identity 'accounting__ledgers'"
        );
    }

    #[test]
    fn test_not_found_kind() {
        let error = RegistryError::not_found(EntityKind::Student, "9999365663");
        assert!(error.is_not_found());
        assert_eq!(error.kind(), EntityKind::Student);
    }

    #[test]
    fn test_invalid_entity_display() {
        let error = RegistryError::invalid(EntityKind::Venue, "no rooms");
        assert_eq!(error.to_string(), "invalid Venue: no rooms");
    }

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::InvalidOption {
            option: "dataset.default_version".to_owned(),
            reason: "must be positive".to_owned(),
        };
        let msg = error.to_string();
        assert!(msg.contains("default_version"));
        assert!(msg.contains("must be positive"));
    }
}
