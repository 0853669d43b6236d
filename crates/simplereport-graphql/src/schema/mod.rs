//! Schema-side permission wiring.
//!
//! ## Components
//!
//! - [`directives`] - The `@requiredPermissions` directive and its gathering
//! - [`SchemaPermissions`] - Permission table built from a schema document
//! - [`PermissionWiring`] - Wraps resolvers with the guards a field requires
//!
//! ## Architecture
//!
//! 1. The schema document is parsed and walked once at startup
//! 2. Every annotated field and argument gets an immutable permission set
//! 3. Resolvers are registered through [`PermissionWiring`], which fails on
//!    fields the document does not define
//! 4. At request time only the guards run; nothing is re-parsed

pub mod directives;
pub mod registry;
mod wiring;

pub use directives::{
    REQUIRED_PERMISSIONS_SDL, RequiredPermissionsDirective, gather_required_permissions,
};
pub use registry::{ArgumentDefinitionInfo, FieldDefinitionInfo, SchemaPermissions};
pub use wiring::PermissionWiring;
