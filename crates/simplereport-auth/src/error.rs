//! Authorization error types.
//!
//! This module defines the errors that can occur while resolving callers into
//! authorization facts. Access denials are not errors at this layer; see
//! [`crate::policy::AccessDecision`].

use std::fmt;

/// Errors that can occur during authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A permission name does not match any known [`crate::UserPermission`].
    #[error("Unknown permission: {name}")]
    UnknownPermission {
        /// The unrecognized permission name.
        name: String,
    },

    /// A role name does not match any known [`crate::OrganizationRole`].
    #[error("Unknown organization role: {name}")]
    UnknownRole {
        /// The unrecognized role name.
        name: String,
    },

    /// An identity-provider claim could not be interpreted.
    #[error("Invalid claim: {message}")]
    InvalidClaim {
        /// Description of why the claim is invalid.
        message: String,
    },

    /// The authenticated user does not have permission to perform the action.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// The authorization configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `UnknownPermission` error.
    #[must_use]
    pub fn unknown_permission(name: impl Into<String>) -> Self {
        Self::UnknownPermission { name: name.into() }
    }

    /// Creates a new `UnknownRole` error.
    #[must_use]
    pub fn unknown_role(name: impl Into<String>) -> Self {
        Self::UnknownRole { name: name.into() }
    }

    /// Creates a new `InvalidClaim` error.
    #[must_use]
    pub fn invalid_claim(message: impl Into<String>) -> Self {
        Self::InvalidClaim {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this error was caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPermission { .. }
                | Self::UnknownRole { .. }
                | Self::InvalidClaim { .. }
                | Self::Forbidden { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownPermission { .. } | Self::UnknownRole { .. } => ErrorCategory::Schema,
            Self::InvalidClaim { .. } => ErrorCategory::Identity,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Broad classification of [`AuthError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed permission or role names.
    Schema,
    /// Problems interpreting identity-provider data.
    Identity,
    /// Access was refused.
    Authorization,
    /// Invalid configuration.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Identity => write!(f, "identity"),
            Self::Authorization => write!(f, "authorization"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}
