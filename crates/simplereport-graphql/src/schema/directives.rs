//! The `@requiredPermissions` schema directive.
//!
//! ```graphql
//! directive @requiredPermissions(
//!   allOf: [String!]
//!   anyOf: [String!]
//! ) repeatable on FIELD_DEFINITION | ARGUMENT_DEFINITION
//! ```
//!
//! Every instance on an element unions its `allOf` into the element's ALL-of
//! set and contributes its `anyOf` as one ANY-of clause. Permission names may
//! be given as strings or enum literals, and a single name is accepted where
//! a list is expected.

use async_graphql_parser::Positioned;
use async_graphql_parser::types::ConstDirective;
use async_graphql_value::ConstValue;
use simplereport_auth::{PermissionSet, UserPermission};
use tracing::warn;

use crate::error::WiringError;

/// Directive name constants.
pub mod names {
    pub const REQUIRED_PERMISSIONS: &str = "requiredPermissions";
    pub const ALL_OF: &str = "allOf";
    pub const ANY_OF: &str = "anyOf";
}

/// SDL declaration of the directive, to prepend to schema documents.
pub const REQUIRED_PERMISSIONS_SDL: &str = "directive @requiredPermissions(allOf: [String!], anyOf: [String!]) repeatable on FIELD_DEFINITION | ARGUMENT_DEFINITION\n";

/// One `@requiredPermissions` instance, with names as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredPermissionsDirective {
    /// Names from `allOf`, if given.
    pub all_of: Option<Vec<String>>,
    /// Names from `anyOf`, if given.
    pub any_of: Option<Vec<String>>,
}

impl RequiredPermissionsDirective {
    /// Reads a parsed directive instance.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown directive arguments or values that are
    /// not permission names.
    pub fn from_const_directive(
        directive: &ConstDirective,
        element: &str,
    ) -> Result<Self, WiringError> {
        let mut result = Self::default();

        for (name, value) in &directive.arguments {
            match name.node.as_str() {
                names::ALL_OF => result.all_of = Some(permission_names(&value.node, element)?),
                names::ANY_OF => result.any_of = Some(permission_names(&value.node, element)?),
                other => {
                    return Err(WiringError::invalid_directive(
                        element,
                        format!("unknown argument '{other}'"),
                    ));
                }
            }
        }

        Ok(result)
    }

    /// Adds this instance's requirements to `permissions`.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not a known permission.
    pub fn apply(
        &self,
        permissions: PermissionSet,
        element: &str,
    ) -> Result<PermissionSet, WiringError> {
        let mut permissions = permissions;

        if let Some(all_of) = &self.all_of {
            permissions = permissions.with_all_of(parse_permissions(all_of, element)?);
        }

        if let Some(any_of) = &self.any_of {
            if any_of.is_empty() {
                warn!(
                    element = %element,
                    "Empty anyOf on @requiredPermissions can only be satisfied by site admins"
                );
            }
            permissions = permissions.with_any_of(parse_permissions(any_of, element)?);
        }

        Ok(permissions)
    }
}

/// Gathers the permission set declared by an element's directives.
///
/// Returns `None` when the element carries no `@requiredPermissions`.
///
/// # Errors
///
/// Returns an error if any instance is malformed or names an unknown
/// permission.
pub fn gather_required_permissions(
    directives: &[Positioned<ConstDirective>],
    element: &str,
) -> Result<Option<PermissionSet>, WiringError> {
    let mut gathered: Option<PermissionSet> = None;

    for directive in directives {
        if directive.node.name.node.as_str() != names::REQUIRED_PERMISSIONS {
            continue;
        }
        let instance = RequiredPermissionsDirective::from_const_directive(&directive.node, element)?;
        gathered = Some(instance.apply(gathered.unwrap_or_default(), element)?);
    }

    Ok(gathered)
}

/// Extracts permission names from a directive argument value.
fn permission_names(value: &ConstValue, element: &str) -> Result<Vec<String>, WiringError> {
    match value {
        ConstValue::List(items) => items
            .iter()
            .map(|item| permission_name(item, element))
            .collect(),
        single => Ok(vec![permission_name(single, element)?]),
    }
}

fn permission_name(value: &ConstValue, element: &str) -> Result<String, WiringError> {
    match value {
        ConstValue::String(name) => Ok(name.clone()),
        ConstValue::Enum(name) => Ok(name.to_string()),
        other => Err(WiringError::invalid_directive(
            element,
            format!("expected a permission name, found {other}"),
        )),
    }
}

fn parse_permissions(names: &[String], element: &str) -> Result<Vec<UserPermission>, WiringError> {
    names
        .iter()
        .map(|name| {
            name.parse::<UserPermission>()
                .map_err(|_| WiringError::UnknownPermission {
                    element: element.to_string(),
                    name: name.clone(),
                })
        })
        .collect()
}
