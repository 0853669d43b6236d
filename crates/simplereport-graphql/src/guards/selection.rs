//! Selection guard.
//!
//! A denied non-nullable field cannot resolve to `null`, so the nearest
//! nullable field above it does. This guard sits on nullable fields whose
//! type can hide such a denial. Before the wrapped resolver runs it walks the
//! requested selection through non-nullable fields and evaluates their field
//! and argument gates. The first denial resolves the guarded field to `null`
//! and is reported once, at the denied field's path.
//!
//! Lists are nulled as a whole; their items do not exist yet when the guard
//! runs. The error path then stops at the list field.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::{PathSegment, SelectionField, ServerError};
use simplereport_auth::Subject;
use tracing::debug;

use super::{ArgumentGuard, FieldGuard, ResolverFn, current_path, current_subject, resolver_fn};
use crate::error::AccessDeniedError;
use crate::schema::{FieldDefinitionInfo, SchemaPermissions};

/// Nulls a nullable field when a non-nullable field in its selection would
/// be denied.
#[derive(Debug, Clone)]
pub struct SelectionGuard {
    permissions: Arc<SchemaPermissions>,
    type_name: String,
    is_list: bool,
    expose_details: bool,
}

/// A denial found below the guarded field.
struct NestedDenial {
    error: AccessDeniedError,
    /// Response keys from the guarded field to the denied field, up to the
    /// first list.
    keys: Vec<String>,
}

impl SelectionGuard {
    /// Creates a guard for a nullable field returning `type_name`.
    #[must_use]
    pub fn new(
        permissions: Arc<SchemaPermissions>,
        type_name: impl Into<String>,
        is_list: bool,
    ) -> Self {
        Self {
            permissions,
            type_name: type_name.into(),
            is_list,
            expose_details: false,
        }
    }

    /// Creates a guard for a field definition.
    ///
    /// Returns `None` if the field is non-nullable or nothing below it can
    /// be denied.
    #[must_use]
    pub fn for_definition(
        permissions: &Arc<SchemaPermissions>,
        field: &FieldDefinitionInfo,
    ) -> Option<Self> {
        if field.is_non_null() || !permissions.may_deny_within(field.base_type()) {
            return None;
        }
        Some(Self::new(
            Arc::clone(permissions),
            field.base_type(),
            field.is_list(),
        ))
    }

    /// Includes the permission gap in client-facing errors.
    #[must_use]
    pub fn with_exposed_details(mut self, expose_details: bool) -> Self {
        self.expose_details = expose_details;
        self
    }

    /// Wraps `inner` so it only runs when nothing in the selection is denied.
    #[must_use]
    pub fn wrap(self, inner: ResolverFn) -> ResolverFn {
        let guard = Arc::new(self);

        resolver_fn(move |ctx| match guard.denial(&ctx) {
            None => (*inner)(ctx),
            Some(error) => {
                ctx.add_error(error);
                FieldFuture::from_value(None)
            }
        })
    }

    /// The error to report for the first denied field in the selection.
    fn denial(&self, ctx: &ResolverContext<'_>) -> Option<ServerError> {
        let path = current_path(ctx);
        let subject = current_subject(ctx);

        let denied = ctx
            .look_ahead()
            .selection_fields()
            .into_iter()
            .find_map(|selection| {
                let mut keys = Vec::new();
                self.find_denial(
                    selection,
                    &self.type_name,
                    subject,
                    &path,
                    &mut keys,
                    !self.is_list,
                )
                .map(|error| NestedDenial { error, keys })
            })?;

        debug!(
            path = %path,
            denied = %denied.error.path(),
            "Nulling field for denied non-null selection"
        );

        let mut error = ctx.set_error_path(
            denied
                .error
                .into_graphql_error(self.expose_details)
                .into_server_error(ctx.item.pos),
        );
        error.path.extend(denied.keys.into_iter().map(PathSegment::Field));
        Some(error)
    }

    fn find_denial(
        &self,
        selection: SelectionField<'_>,
        type_name: &str,
        subject: Option<&Subject>,
        path: &str,
        keys: &mut Vec<String>,
        exact: bool,
    ) -> Option<AccessDeniedError> {
        for child in selection.selection_set() {
            let Some(definition) = self.permissions.field(type_name, child.name()) else {
                continue;
            };
            if !definition.is_non_null() {
                continue;
            }

            let key = child.alias().unwrap_or(child.name());
            let child_path = format!("{path}.{key}");
            if exact {
                keys.push(key.to_string());
            }

            if let Err(denied) = check_field(definition, &child, subject, &child_path) {
                return Some(denied);
            }

            let found = self.find_denial(
                child,
                definition.base_type(),
                subject,
                &child_path,
                keys,
                exact && !definition.is_list(),
            );
            if found.is_some() {
                return found;
            }

            if exact {
                keys.pop();
            }
        }

        None
    }
}

/// Runs the field gate and the argument gates of one selected field.
fn check_field(
    definition: &FieldDefinitionInfo,
    selection: &SelectionField<'_>,
    subject: Option<&Subject>,
    path: &str,
) -> Result<(), AccessDeniedError> {
    if let Some(guard) = FieldGuard::for_definition(definition) {
        guard.check(subject, path)?;
    }

    let supplied = selection.arguments().unwrap_or_default();
    for argument in &definition.arguments {
        let Some(guard) = ArgumentGuard::for_definition(argument) else {
            continue;
        };
        let value = supplied
            .iter()
            .find(|(name, _)| name.as_str() == argument.name)
            .map(|(_, value)| value);
        guard.check(value, subject, path)?;
    }

    Ok(())
}
