//! # simplereport-graphql
//!
//! Permission-gated GraphQL resolution for the SimpleReport API.
//!
//! Schema elements declare the permissions they require with the
//! `@requiredPermissions` directive:
//!
//! ```graphql
//! type Query {
//!   patients(
//!     includeArchived: Boolean = false
//!       @requiredPermissions(allOf: ["READ_ARCHIVED_PATIENT_LIST"])
//!   ): [Patient]
//!     @requiredPermissions(anyOf: ["READ_PATIENT_LIST", "SEARCH_PATIENTS"])
//! }
//! ```
//!
//! ## Overview
//!
//! At wiring time the schema document is walked once and every annotated
//! field and argument gets an immutable permission set. Resolvers registered
//! through [`PermissionWiring`] are wrapped by an [`ArgumentGuard`] per gated
//! argument and a [`FieldGuard`] for a gated field. Nullable fields that can
//! enclose a denied non-nullable field also get a [`SelectionGuard`], which
//! resolves them to `null` in its place. At request time the guards evaluate
//! the caller's [`simplereport_auth::Subject`], taken from the request's
//! [`GraphQLContext`], before the wrapped resolver runs.
//!
//! ## Modules
//!
//! - [`config`] - Configuration options
//! - [`schema`] - Directive gathering, schema permission registry, wiring
//! - [`guards`] - Field and argument guards
//! - [`context`] - GraphQL execution context
//! - [`error`] - Error types for wiring and access denial

pub mod config;
pub mod context;
pub mod error;
pub mod guards;
pub mod schema;

// Re-export main types
pub use config::GraphQLConfig;
pub use context::{ContextBuilderError, GraphQLContext, GraphQLContextBuilder};
pub use error::{AccessDeniedError, GraphQLError, WiringError};
pub use guards::{ArgumentGuard, DenialMode, FieldGuard, ResolverFn, SelectionGuard};
pub use schema::{
    FieldDefinitionInfo, PermissionWiring, REQUIRED_PERMISSIONS_SDL, SchemaPermissions,
};

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
