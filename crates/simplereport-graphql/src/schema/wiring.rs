//! Attaching permission guards to resolvers.
//!
//! ```ignore
//! let permissions = Arc::new(SchemaPermissions::from_sdl(&sdl)?);
//! let wiring = PermissionWiring::new(permissions, &config);
//!
//! let query = Object::new("Query")
//!     .field(wiring.field("Query", "patients", PatientResolver::resolve())?);
//! let schema = wiring.finish(Schema::build("Query", None, None).register(query))?;
//! ```

use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, ResolverContext, Schema, SchemaBuilder};
use tracing::debug;

use super::registry::SchemaPermissions;
use crate::config::GraphQLConfig;
use crate::error::{GraphQLError, WiringError};
use crate::guards::{
    ArgumentGuard, DenialMode, FieldGuard, ResolverFn, SelectionGuard, resolver_fn,
};

/// Wraps resolvers with the guards their schema definition requires.
#[derive(Debug, Clone)]
pub struct PermissionWiring {
    permissions: Arc<SchemaPermissions>,
    config: GraphQLConfig,
}

impl PermissionWiring {
    /// Creates a wiring over a gathered permission table.
    #[must_use]
    pub fn new(permissions: Arc<SchemaPermissions>, config: &GraphQLConfig) -> Self {
        Self {
            permissions,
            config: config.clone(),
        }
    }

    /// Parses `sdl` and creates a wiring over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or an annotation is
    /// invalid.
    pub fn from_sdl(sdl: &str, config: &GraphQLConfig) -> Result<Self, WiringError> {
        Ok(Self::new(Arc::new(SchemaPermissions::from_sdl(sdl)?), config))
    }

    /// The permission table.
    #[must_use]
    pub fn permissions(&self) -> &SchemaPermissions {
        &self.permissions
    }

    /// Returns `resolver` wrapped by the field's selection guard (innermost),
    /// argument guards and field guard (outermost).
    ///
    /// Ungated fields get `resolver` back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnknownField`] if the document does not define
    /// the field, and [`WiringError::NoNullableAncestor`] for a non-null
    /// field of a root type that may be denied.
    pub fn wrap<F>(
        &self,
        type_name: &str,
        field_name: &str,
        resolver: F,
    ) -> Result<ResolverFn, WiringError>
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        let definition = self.permissions.require_field(type_name, field_name)?;
        if self.permissions.is_root_type(type_name) && self.permissions.may_deny_through(definition)
        {
            return Err(WiringError::no_nullable_ancestor(type_name, field_name));
        }

        let expose_details = self.config.expose_denial_details;
        let mode = DenialMode::for_field(definition.is_non_null());
        let mut wrapped = resolver_fn(resolver);

        if let Some(guard) = SelectionGuard::for_definition(&self.permissions, definition) {
            debug!(
                field = %format!("{type_name}.{field_name}"),
                "Guarding selection"
            );
            wrapped = guard.with_exposed_details(expose_details).wrap(wrapped);
        }

        for argument in &definition.arguments {
            if let Some(guard) = ArgumentGuard::for_definition(argument) {
                debug!(
                    field = %format!("{type_name}.{field_name}"),
                    argument = %argument.name,
                    "Guarding argument"
                );
                wrapped = guard
                    .with_mode(mode)
                    .with_exposed_details(expose_details)
                    .wrap(wrapped);
            }
        }

        if let Some(guard) = FieldGuard::for_definition(definition) {
            debug!(
                field = %format!("{type_name}.{field_name}"),
                mode = ?guard.mode(),
                "Guarding field"
            );
            wrapped = guard.with_exposed_details(expose_details).wrap(wrapped);
        }

        Ok(wrapped)
    }

    /// Builds a dynamic-schema field with the declared type and arguments and
    /// a guarded resolver.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnknownField`] if the document does not define
    /// the field.
    pub fn field<F>(
        &self,
        type_name: &str,
        field_name: &str,
        resolver: F,
    ) -> Result<Field, WiringError>
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        let guarded = self.wrap(type_name, field_name, resolver)?;
        let definition = self.permissions.require_field(type_name, field_name)?;

        let field = definition.arguments.iter().fold(
            Field::new(field_name, definition.ty.clone(), move |ctx| (*guarded)(ctx)),
            |field, argument| field.argument(argument.to_input_value()),
        );

        Ok(field)
    }

    /// Applies the configured limits and finishes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the schema does
    /// not build.
    pub fn finish(&self, builder: SchemaBuilder) -> Result<Schema, GraphQLError> {
        self.config
            .validate()
            .map_err(GraphQLError::Configuration)?;

        let schema = self
            .config
            .apply(builder)
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        debug!(
            protected_fields = self.permissions.protected_fields().count(),
            "GraphQL schema build complete"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::REQUIRED_PERMISSIONS_SDL;

    fn wiring() -> PermissionWiring {
        let sdl = format!(
            r#"{REQUIRED_PERMISSIONS_SDL}
type Query {{
  open: String
  secret: String @requiredPermissions(allOf: ["MANAGE_USERS"])
  count: Int! @requiredPermissions(allOf: ["MANAGE_USERS"])
  me: User!
  total: Int!
}}
type User {{ email: String! @requiredPermissions(allOf: ["MANAGE_USERS"]) }}
"#
        );
        PermissionWiring::from_sdl(&sdl, &GraphQLConfig::default()).unwrap()
    }

    #[test]
    fn test_unknown_field_fails() {
        let err = wiring()
            .field("Query", "missing", |_| FieldFuture::from_value(None))
            .err()
            .unwrap();
        assert_eq!(err, WiringError::unknown_field("Query", "missing"));
    }

    #[test]
    fn test_known_fields_wire() {
        let wiring = wiring();
        assert!(
            wiring
                .field("Query", "open", |_| FieldFuture::from_value(None))
                .is_ok()
        );
        assert!(
            wiring
                .wrap("Query", "secret", |_| FieldFuture::from_value(None))
                .is_ok()
        );
        assert_eq!(wiring.permissions().protected_fields().count(), 3);
    }

    #[test]
    fn test_root_non_null_field_that_may_be_denied_fails() {
        let wiring = wiring();

        let err = wiring
            .wrap("Query", "count", |_| FieldFuture::from_value(None))
            .err()
            .unwrap();
        assert_eq!(err, WiringError::no_nullable_ancestor("Query", "count"));

        let err = wiring
            .wrap("Query", "me", |_| FieldFuture::from_value(None))
            .err()
            .unwrap();
        assert_eq!(err, WiringError::no_nullable_ancestor("Query", "me"));

        assert!(
            wiring
                .wrap("Query", "total", |_| FieldFuture::from_value(None))
                .is_ok()
        );
        assert!(
            wiring
                .wrap("User", "email", |_| FieldFuture::from_value(None))
                .is_ok()
        );
    }

    #[test]
    fn test_invalid_config_fails_finish() {
        let config = GraphQLConfig {
            max_depth: 0,
            ..Default::default()
        };
        let wiring = PermissionWiring::new(Arc::new(SchemaPermissions::default()), &config);
        let result = wiring.finish(Schema::build("Query", None, None));
        assert!(matches!(result, Err(GraphQLError::Configuration(_))));
    }
}
