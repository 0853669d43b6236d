//! Field guard.
//!
//! A denied nullable field resolves to `null` with an access-denied error at
//! its path, leaving siblings intact. A denied non-nullable field is raised
//! to its nearest nullable ancestor, whose [`SelectionGuard`] resolves to
//! `null` instead.
//!
//! [`SelectionGuard`]: super::SelectionGuard

use std::sync::Arc;

use async_graphql::Pos;
use simplereport_auth::{AccessDecision, AccessEvaluator, AccessTarget, PermissionSet, Subject};

use super::{ResolverFn, current_path, current_subject, reject, resolver_fn};
use crate::error::AccessDeniedError;
use crate::schema::FieldDefinitionInfo;

/// How a denial surfaces, fixed per field at wiring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialMode {
    /// Null the nearest nullable ancestor; used for non-nullable fields.
    Raise,
    /// Resolve to `null` and attach the error; used for nullable fields.
    NullWithError,
}

impl DenialMode {
    /// Picks the mode for a field's declared nullability.
    #[must_use]
    pub fn for_field(non_null: bool) -> Self {
        if non_null {
            Self::Raise
        } else {
            Self::NullWithError
        }
    }
}

/// Gates resolution of one field.
#[derive(Debug, Clone)]
pub struct FieldGuard {
    permissions: Arc<PermissionSet>,
    mode: DenialMode,
    location: Pos,
    expose_details: bool,
    evaluator: AccessEvaluator,
}

impl FieldGuard {
    /// Creates a guard for a field.
    #[must_use]
    pub fn new(permissions: Arc<PermissionSet>, non_null: bool, location: Pos) -> Self {
        Self {
            permissions,
            mode: DenialMode::for_field(non_null),
            location,
            expose_details: false,
            evaluator: AccessEvaluator,
        }
    }

    /// Creates a guard from a gated field definition.
    ///
    /// Returns `None` if the field itself is not gated.
    #[must_use]
    pub fn for_definition(field: &FieldDefinitionInfo) -> Option<Self> {
        field
            .permissions
            .clone()
            .map(|permissions| Self::new(permissions, field.is_non_null(), field.position))
    }

    /// Includes the permission gap in client-facing errors.
    #[must_use]
    pub fn with_exposed_details(mut self, expose_details: bool) -> Self {
        self.expose_details = expose_details;
        self
    }

    /// How a denial surfaces.
    #[must_use]
    pub fn mode(&self) -> DenialMode {
        self.mode
    }

    /// Checks the subject against the field's permissions.
    ///
    /// # Errors
    ///
    /// Returns the access-denied error to surface at `path`.
    pub fn check(&self, subject: Option<&Subject>, path: &str) -> Result<(), AccessDeniedError> {
        let target = AccessTarget::field(path, self.mode == DenialMode::Raise);

        match self.evaluator.evaluate(&self.permissions, subject, &target) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(AccessDeniedError::Field {
                path: path.to_string(),
                location: self.location,
                reason,
            }),
        }
    }

    /// Wraps `inner` so it only runs when the check passes.
    #[must_use]
    pub fn wrap(self, inner: ResolverFn) -> ResolverFn {
        let guard = Arc::new(self);

        resolver_fn(move |ctx| {
            let path = current_path(&ctx);
            let checked = guard.check(current_subject(&ctx), &path);
            match checked {
                Ok(()) => (*inner)(ctx),
                Err(denied) => reject(
                    &ctx,
                    guard.mode,
                    denied.into_graphql_error(guard.expose_details),
                ),
            }
        })
    }
}
