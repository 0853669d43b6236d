//! Error types for GraphQL operations.
//!
//! [`WiringError`] is raised while attaching permission guards to a schema and
//! is fatal at startup. [`AccessDeniedError`] is raised by the guards at
//! request time and converted into a GraphQL error with extensions.
//! [`GraphQLError`] is the crate-level error.

use async_graphql::{ErrorExtensions, Pos, Value};
use simplereport_auth::DenyReason;

// =============================================================================
// Wiring Errors
// =============================================================================

/// Errors raised while building the permission table for a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WiringError {
    /// The schema document could not be parsed.
    #[error("Failed to parse schema document: {0}")]
    Parse(String),

    /// A resolver was registered for a field the document does not define.
    #[error("Field {type_name}.{field_name} is not defined in the schema")]
    UnknownField {
        /// Parent type name.
        type_name: String,
        /// Field name.
        field_name: String,
    },

    /// A directive names a permission that does not exist.
    #[error("Unknown permission '{name}' required on {element}")]
    UnknownPermission {
        /// The annotated element, e.g. `Query.patients`.
        element: String,
        /// The unrecognized name.
        name: String,
    },

    /// A directive argument has an unsupported shape.
    #[error("Invalid @requiredPermissions on {element}: {message}")]
    InvalidDirective {
        /// The annotated element.
        element: String,
        /// What is wrong.
        message: String,
    },

    /// A non-null field of a root type can be denied, and no nullable field
    /// encloses it to resolve to `null` instead.
    #[error(
        "Field {type_name}.{field_name} is non-null and may be denied, but no nullable field encloses it"
    )]
    NoNullableAncestor {
        /// Root type name.
        type_name: String,
        /// Field name.
        field_name: String,
    },
}

impl WiringError {
    /// Create an invalid directive error.
    pub fn invalid_directive(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDirective {
            element: element.into(),
            message: message.into(),
        }
    }

    /// Create an unknown field error.
    pub fn unknown_field(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }

    /// Create a no nullable ancestor error.
    pub fn no_nullable_ancestor(
        type_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self::NoNullableAncestor {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }
}

// =============================================================================
// Access Denied
// =============================================================================

/// Raised by a guard when the caller lacks the required permissions.
///
/// The message names the argument or the field path only; the permission
/// gap stays in [`Self::reason`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDeniedError {
    /// A gated argument was supplied with a non-default value.
    #[error("Current user does not have permission to supply a non-default value for [{name}]")]
    Argument {
        /// Argument name.
        name: String,
        /// Response path of the field receiving the argument.
        path: String,
        /// Why access was denied.
        reason: DenyReason,
    },

    /// A gated field was requested.
    #[error("Current user does not have permission to request [{path}]")]
    Field {
        /// Response path of the field.
        path: String,
        /// Source location of the field definition.
        location: Pos,
        /// Why access was denied.
        reason: DenyReason,
    },
}

impl AccessDeniedError {
    /// Extension code attached to every access-denied error.
    pub const CODE: &'static str = "FORBIDDEN";

    /// Why access was denied.
    #[must_use]
    pub fn reason(&self) -> &DenyReason {
        match self {
            Self::Argument { reason, .. } | Self::Field { reason, .. } => reason,
        }
    }

    /// Response path of the denied element.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Argument { path, .. } | Self::Field { path, .. } => path,
        }
    }

    /// Source location of the field definition, for field denials.
    #[must_use]
    pub fn definition_location(&self) -> Option<Pos> {
        match self {
            Self::Field { location, .. } => Some(*location),
            Self::Argument { .. } => None,
        }
    }

    /// Converts to a GraphQL error carrying the `FORBIDDEN` code.
    ///
    /// Field denials also carry `definitionLocation`, the `line` and `column`
    /// of the field in the schema document. With `expose_details` the
    /// extensions also carry the deny reason and the permission gap.
    #[must_use]
    pub fn into_graphql_error(self, expose_details: bool) -> async_graphql::Error {
        let reason = self.reason().clone();
        let location = self
            .definition_location()
            .and_then(|location| async_graphql::to_value(location).ok());

        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", Self::CODE);

            if let Some(location) = location {
                e.set("definitionLocation", location);
            }

            if expose_details {
                e.set("reason", reason.code());
                if let Ok(details) = Value::from_json(reason.details()) {
                    e.set("details", details);
                }
            }
        })
    }
}

// =============================================================================
// Crate Error
// =============================================================================

/// Errors that can occur during GraphQL operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphQLError {
    /// Permission wiring failed.
    #[error(transparent)]
    Wiring(#[from] WiringError),

    /// Schema build failed.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),

    /// Invalid configuration.
    #[error("Invalid GraphQL configuration: {0}")]
    Configuration(String),

    /// Permission denied.
    #[error(transparent)]
    Forbidden(#[from] AccessDeniedError),
}

impl GraphQLError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Wiring(_) | Self::SchemaBuildFailed(_) | Self::Configuration(_) => 500,
            Self::Forbidden(_) => 403,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Wiring(_) => "WIRING_FAILED",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Forbidden(_) => AccessDeniedError::CODE,
        }
    }
}
