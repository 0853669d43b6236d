//! Wiring-time permission table for a schema document.
//!
//! [`SchemaPermissions::from_sdl`] walks every object and interface type of a
//! schema document once and records, per field, the declared type, the
//! definition position, and the permission sets gathered for the field and
//! its arguments. The table is immutable afterwards and shared by all
//! requests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{InputValue, TypeRef};
use async_graphql_parser::types::{
    BaseType, FieldDefinition, InputValueDefinition, SchemaDefinition, Type, TypeKind,
    TypeSystemDefinition,
};
use async_graphql_parser::{Pos, Positioned, parse_schema};
use simplereport_auth::PermissionSet;
use tracing::{debug, warn};

use super::directives::gather_required_permissions;
use crate::error::WiringError;

/// A field argument as declared in the schema document.
#[derive(Debug, Clone)]
pub struct ArgumentDefinitionInfo {
    /// Argument name.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Declared default value.
    pub default_value: Option<Value>,
    /// Required permissions, if the argument is gated.
    pub permissions: Option<Arc<PermissionSet>>,
}

impl ArgumentDefinitionInfo {
    /// Builds the dynamic-schema input value for this argument.
    #[must_use]
    pub fn to_input_value(&self) -> InputValue {
        let input = InputValue::new(self.name.clone(), self.ty.clone());
        match &self.default_value {
            Some(default) => input.default_value(default.clone()),
            None => input,
        }
    }
}

/// A field as declared in the schema document.
#[derive(Debug, Clone)]
pub struct FieldDefinitionInfo {
    /// Parent type name.
    pub type_name: String,
    /// Field name.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Source position of the field definition.
    pub position: Pos,
    /// Required permissions, if the field is gated.
    pub permissions: Option<Arc<PermissionSet>>,
    /// Declared arguments, in document order.
    pub arguments: Vec<ArgumentDefinitionInfo>,
}

impl FieldDefinitionInfo {
    /// Returns `true` if the declared type is non-nullable.
    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self.ty, TypeRef::NonNull(_))
    }

    /// Name of the declared type without list and non-null wrappers.
    #[must_use]
    pub fn base_type(&self) -> &str {
        self.ty.type_name()
    }

    /// Returns `true` if the declared type is a list at any level.
    #[must_use]
    pub fn is_list(&self) -> bool {
        match &self.ty {
            TypeRef::NonNull(inner) => matches!(**inner, TypeRef::List(_)),
            TypeRef::List(_) => true,
            TypeRef::Named(_) => false,
        }
    }

    /// Returns `true` if the field or any of its arguments is gated.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.permissions.is_some() || self.arguments.iter().any(|arg| arg.permissions.is_some())
    }

    /// Looks up a declared argument.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&ArgumentDefinitionInfo> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// Permission table for every field of a schema document.
#[derive(Debug, Clone, Default)]
pub struct SchemaPermissions {
    fields: HashMap<(String, String), FieldDefinitionInfo>,
    root_types: HashSet<String>,
}

impl SchemaPermissions {
    /// Parses a schema document and gathers every `@requiredPermissions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or an annotation is
    /// malformed or names an unknown permission.
    pub fn from_sdl(sdl: &str) -> Result<Self, WiringError> {
        let document = parse_schema(sdl).map_err(|e| WiringError::Parse(e.to_string()))?;
        let mut fields = HashMap::new();
        let mut root_types = HashSet::new();

        for definition in &document.definitions {
            let type_definition = match definition {
                TypeSystemDefinition::Type(type_definition) => type_definition,
                TypeSystemDefinition::Schema(schema) => {
                    root_types.extend(operation_types(&schema.node));
                    continue;
                }
                TypeSystemDefinition::Directive(_) => continue,
            };
            let type_name = type_definition.node.name.node.as_str();
            let field_definitions = match &type_definition.node.kind {
                TypeKind::Object(object) => &object.fields,
                TypeKind::Interface(interface) => &interface.fields,
                _ => continue,
            };

            for field in field_definitions {
                let info = field_info(type_name, field)?;
                fields.insert((info.type_name.clone(), info.name.clone()), info);
            }
        }

        if root_types.is_empty() {
            root_types.extend(DEFAULT_ROOT_TYPES.map(String::from));
        }

        let registry = Self { fields, root_types };
        debug!(
            fields = registry.fields.len(),
            protected = registry.protected_fields().count(),
            "Gathered schema permissions"
        );
        Ok(registry)
    }

    /// Looks up a field definition.
    #[must_use]
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinitionInfo> {
        self.fields
            .get(&(type_name.to_string(), field_name.to_string()))
    }

    /// Returns a field definition or a wiring error naming it.
    ///
    /// # Errors
    ///
    /// Returns [`WiringError::UnknownField`] if the document does not define it.
    pub fn require_field(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> Result<&FieldDefinitionInfo, WiringError> {
        self.field(type_name, field_name)
            .ok_or_else(|| WiringError::unknown_field(type_name, field_name))
    }

    /// Iterates over the fields of one type.
    pub fn fields_of<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a FieldDefinitionInfo> + 'a {
        self.fields
            .values()
            .filter(move |field| field.type_name == type_name)
    }

    /// Returns `true` if `type_name` is an operation root type.
    #[must_use]
    pub fn is_root_type(&self, type_name: &str) -> bool {
        self.root_types.contains(type_name)
    }

    /// Returns `true` if a denial can surface at `field` and has to travel to
    /// an enclosing nullable field.
    ///
    /// That is the case when the field is non-null and either gated itself or
    /// of a type that may deny within.
    #[must_use]
    pub fn may_deny_through(&self, field: &FieldDefinitionInfo) -> bool {
        field.is_non_null() && (field.is_protected() || self.may_deny_within(field.base_type()))
    }

    /// Returns `true` if a selection on `type_name` can hit a gated field
    /// reached only through non-null fields.
    #[must_use]
    pub fn may_deny_within(&self, type_name: &str) -> bool {
        self.may_deny_below(type_name, &mut HashSet::new())
    }

    fn may_deny_below<'a>(&'a self, type_name: &'a str, visited: &mut HashSet<&'a str>) -> bool {
        if !visited.insert(type_name) {
            return false;
        }

        self.fields_of(type_name)
            .filter(|field| field.is_non_null())
            .any(|field| field.is_protected() || self.may_deny_below(field.base_type(), visited))
    }

    /// Iterates over fields that are gated themselves or through an argument.
    pub fn protected_fields(&self) -> impl Iterator<Item = &FieldDefinitionInfo> {
        self.fields.values().filter(|field| field.is_protected())
    }

    /// Number of fields in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the document defines no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

const DEFAULT_ROOT_TYPES: [&str; 3] = ["Query", "Mutation", "Subscription"];

fn operation_types(schema: &SchemaDefinition) -> impl Iterator<Item = String> + '_ {
    [&schema.query, &schema.mutation, &schema.subscription]
        .into_iter()
        .flatten()
        .map(|name| name.node.to_string())
}

fn field_info(
    type_name: &str,
    field: &Positioned<FieldDefinition>,
) -> Result<FieldDefinitionInfo, WiringError> {
    let name = field.node.name.node.to_string();
    let element = format!("{type_name}.{name}");

    let permissions = gated(
        gather_required_permissions(&field.node.directives, &element)?,
        &element,
    );

    let arguments = field
        .node
        .arguments
        .iter()
        .map(|argument| argument_info(&element, argument))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FieldDefinitionInfo {
        type_name: type_name.to_string(),
        name,
        ty: type_ref(&field.node.ty.node),
        position: field.pos,
        permissions,
        arguments,
    })
}

fn argument_info(
    field_element: &str,
    argument: &Positioned<InputValueDefinition>,
) -> Result<ArgumentDefinitionInfo, WiringError> {
    let name = argument.node.name.node.to_string();
    let element = format!("{field_element}({name})");

    let permissions = gated(
        gather_required_permissions(&argument.node.directives, &element)?,
        &element,
    );

    Ok(ArgumentDefinitionInfo {
        ty: type_ref(&argument.node.ty.node),
        default_value: argument
            .node
            .default_value
            .as_ref()
            .map(|value| value.node.clone()),
        permissions,
        name,
    })
}

/// Keeps a gathered set only if it restricts anything.
fn gated(permissions: Option<PermissionSet>, element: &str) -> Option<Arc<PermissionSet>> {
    match permissions {
        Some(permissions) if permissions.is_unrestricted() => {
            warn!(element = %element, "@requiredPermissions declares no permissions; ignoring");
            None
        }
        Some(permissions) => Some(Arc::new(permissions)),
        None => None,
    }
}

/// Converts a parsed type into a dynamic-schema type reference.
fn type_ref(ty: &Type) -> TypeRef {
    let base = match &ty.base {
        BaseType::Named(name) => TypeRef::named(name.to_string()),
        BaseType::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
    };

    if ty.nullable {
        base
    } else {
        TypeRef::NonNull(Box::new(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::REQUIRED_PERMISSIONS_SDL;
    use simplereport_auth::UserPermission;

    const SDL: &str = r#"
type Query {
  patients(
    facilityId: ID
    includeArchived: Boolean = false @requiredPermissions(allOf: ["READ_ARCHIVED_PATIENT_LIST"])
  ): [String!] @requiredPermissions(anyOf: ["READ_PATIENT_LIST", "SEARCH_PATIENTS"])
  organization: Organization
}

type Organization {
  name: String
  internalId: ID! @requiredPermissions(allOf: ["EDIT_ORGANIZATION"])
}

interface Node {
  id: ID! @requiredPermissions(allOf: ["MANAGE_USERS"])
}

enum Role { ADMIN }
"#;

    fn registry() -> SchemaPermissions {
        SchemaPermissions::from_sdl(&format!("{REQUIRED_PERMISSIONS_SDL}{SDL}")).unwrap()
    }

    #[test]
    fn test_walks_objects_and_interfaces() {
        let registry = registry();
        assert_eq!(registry.len(), 5);
        assert!(registry.field("Node", "id").is_some());
        assert_eq!(registry.protected_fields().count(), 3);
    }

    #[test]
    fn test_field_types_and_nullability() {
        let registry = registry();

        let patients = registry.field("Query", "patients").unwrap();
        assert!(!patients.is_non_null());
        assert_eq!(patients.ty.to_string(), "[String!]");

        let internal_id = registry.field("Organization", "internalId").unwrap();
        assert!(internal_id.is_non_null());
        assert_eq!(internal_id.ty.to_string(), "ID!");
    }

    #[test]
    fn test_arguments_record_defaults_and_permissions() {
        let registry = registry();
        let patients = registry.field("Query", "patients").unwrap();

        let facility = patients.argument("facilityId").unwrap();
        assert!(facility.permissions.is_none());
        assert!(facility.default_value.is_none());

        let archived = patients.argument("includeArchived").unwrap();
        assert_eq!(archived.default_value, Some(Value::Boolean(false)));
        let permissions = archived.permissions.as_ref().unwrap();
        assert!(
            permissions
                .all_of()
                .contains(&UserPermission::ReadArchivedPatientList)
        );
    }

    #[test]
    fn test_unannotated_field_is_not_gated() {
        let registry = registry();
        let name = registry.field("Organization", "name").unwrap();
        assert!(name.permissions.is_none());
        assert!(!name.is_protected());
    }

    #[test]
    fn test_denials_travel_through_non_null_fields() {
        let registry = registry();

        assert!(registry.may_deny_within("Organization"));
        assert!(!registry.may_deny_within("String"));
        assert!(!registry.may_deny_within("Role"));

        let organization = registry.field("Query", "organization").unwrap();
        assert!(!registry.may_deny_through(organization));
        let internal_id = registry.field("Organization", "internalId").unwrap();
        assert!(registry.may_deny_through(internal_id));
    }

    #[test]
    fn test_cyclic_types_terminate() {
        let sdl = format!(
            "{REQUIRED_PERMISSIONS_SDL}type Query {{ node: Node }} type Node {{ parent: Node! child: Node! }}"
        );
        let registry = SchemaPermissions::from_sdl(&sdl).unwrap();
        assert!(!registry.may_deny_within("Node"));
    }

    #[test]
    fn test_root_types() {
        let registry = registry();
        assert!(registry.is_root_type("Query"));
        assert!(registry.is_root_type("Mutation"));
        assert!(!registry.is_root_type("Organization"));

        let sdl = "schema { query: Root } type Root { version: String } type Query { a: String }";
        let registry = SchemaPermissions::from_sdl(sdl).unwrap();
        assert!(registry.is_root_type("Root"));
        assert!(!registry.is_root_type("Query"));
    }

    #[test]
    fn test_list_types() {
        let registry = registry();
        assert!(registry.field("Query", "patients").unwrap().is_list());
        assert!(!registry.field("Query", "organization").unwrap().is_list());
        assert_eq!(
            registry.field("Query", "patients").unwrap().base_type(),
            "String"
        );
    }

    #[test]
    fn test_require_unknown_field() {
        let err = registry().require_field("Query", "facilities").unwrap_err();
        assert_eq!(err, WiringError::unknown_field("Query", "facilities"));
    }

    #[test]
    fn test_unknown_permission_fails_wiring() {
        let sdl = r#"type Query { secret: String @requiredPermissions(allOf: ["READ_MINDS"]) }"#;
        assert!(matches!(
            SchemaPermissions::from_sdl(sdl),
            Err(WiringError::UnknownPermission { .. })
        ));
    }

    #[test]
    fn test_unparseable_document() {
        assert!(matches!(
            SchemaPermissions::from_sdl("type Query {"),
            Err(WiringError::Parse(_))
        ));
    }
}
