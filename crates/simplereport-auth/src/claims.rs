//! Organization role claims.
//!
//! The identity provider represents organization membership as groups named
//! `{role_prefix}{organization_external_id}:{ROLE}`. [`RoleClaimParser`] turns a
//! user's group names back into [`OrganizationRoleClaims`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthorizationConfig;
use crate::permission::{OrganizationRole, PermissionHolder};

/// The roles and facilities a user has been granted in one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRoleClaims {
    /// External identifier of the organization.
    pub organization_external_id: String,

    /// Facilities the user was explicitly granted.
    ///
    /// Ignored when the roles grant access to all facilities.
    #[serde(default)]
    pub facilities: BTreeSet<Uuid>,

    /// Roles held in the organization.
    pub roles: BTreeSet<OrganizationRole>,
}

impl OrganizationRoleClaims {
    /// Creates claims for an organization; the default role is always included.
    #[must_use]
    pub fn new(
        organization_external_id: impl Into<String>,
        roles: impl IntoIterator<Item = OrganizationRole>,
    ) -> Self {
        let mut roles: BTreeSet<_> = roles.into_iter().collect();
        roles.insert(OrganizationRole::default_role());

        Self {
            organization_external_id: organization_external_id.into(),
            facilities: BTreeSet::new(),
            roles,
        }
    }

    /// Sets the explicitly granted facilities.
    #[must_use]
    pub fn with_facilities(mut self, facilities: impl IntoIterator<Item = Uuid>) -> Self {
        self.facilities = facilities.into_iter().collect();
        self
    }
}

impl PermissionHolder for OrganizationRoleClaims {
    fn roles(&self) -> &BTreeSet<OrganizationRole> {
        &self.roles
    }
}

// =============================================================================
// Group Name Parsing
// =============================================================================

/// Parses identity-provider group names into organization role claims.
#[derive(Debug, Clone)]
pub struct RoleClaimParser {
    role_prefix: String,
}

impl RoleClaimParser {
    /// Creates a parser for groups starting with `role_prefix`.
    #[must_use]
    pub fn new(role_prefix: impl Into<String>) -> Self {
        Self {
            role_prefix: role_prefix.into(),
        }
    }

    /// Creates a parser from the authorization configuration.
    #[must_use]
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self::new(config.role_prefix.clone())
    }

    /// Returns the group name granting `role` in an organization.
    #[must_use]
    pub fn group_name(&self, organization_external_id: &str, role: OrganizationRole) -> String {
        format!("{}{}:{}", self.role_prefix, organization_external_id, role)
    }

    /// Parses a single group name into `(organization_external_id, role)`.
    ///
    /// Returns `None` for groups that do not carry an organization role.
    #[must_use]
    pub fn parse_group(&self, group_name: &str) -> Option<(String, OrganizationRole)> {
        let rest = group_name.strip_prefix(&self.role_prefix)?;

        OrganizationRole::ALL.into_iter().find_map(|role| {
            let organization = rest.strip_suffix(role.as_str())?.strip_suffix(':')?;
            (!organization.is_empty()).then(|| (organization.to_string(), role))
        })
    }

    /// Builds claims from all of a user's group names.
    ///
    /// Returns `None` unless the role groups reference exactly one organization.
    pub fn parse<'a>(
        &self,
        group_names: impl IntoIterator<Item = &'a str>,
    ) -> Option<OrganizationRoleClaims> {
        let mut organizations = BTreeSet::new();
        let mut roles = BTreeSet::new();

        for group_name in group_names {
            match self.parse_group(group_name) {
                Some((organization, role)) => {
                    organizations.insert(organization);
                    roles.insert(role);
                }
                None => debug!(group = %group_name, "Ignoring non-role group"),
            }
        }

        if organizations.len() != 1 {
            warn!(
                count = organizations.len(),
                "User is in {} organizations, not 1",
                organizations.len()
            );
            return None;
        }

        let organization = organizations.into_iter().next()?;
        Some(OrganizationRoleClaims::new(organization, roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "SR-TEST-TENANT:";

    #[test]
    fn test_group_name_format() {
        let parser = RoleClaimParser::new(PREFIX);
        assert_eq!(
            parser.group_name("DIS_ORG", OrganizationRole::EntryOnly),
            "SR-TEST-TENANT:DIS_ORG:ENTRY_ONLY"
        );
    }

    #[test]
    fn test_parse_group() {
        let parser = RoleClaimParser::new(PREFIX);
        assert_eq!(
            parser.parse_group("SR-TEST-TENANT:DIS_ORG:ADMIN"),
            Some(("DIS_ORG".to_string(), OrganizationRole::Admin))
        );
        assert_eq!(parser.parse_group("SR-OTHER-TENANT:DIS_ORG:ADMIN"), None);
        assert_eq!(parser.parse_group("SR-TEST-TENANT:DIS_ORG:OWNER"), None);
        assert_eq!(parser.parse_group("SR-TEST-TENANT::USER"), None);
        assert_eq!(parser.parse_group("Everyone"), None);
    }

    #[test]
    fn test_parse_claims_for_single_organization() {
        let parser = RoleClaimParser::new(PREFIX);
        let claims = parser
            .parse([
                "Everyone",
                "SR-TEST-TENANT:DIS_ORG:NO_ACCESS",
                "SR-TEST-TENANT:DIS_ORG:USER",
            ])
            .unwrap();

        assert_eq!(claims.organization_external_id, "DIS_ORG");
        assert_eq!(claims.effective_role(), Some(OrganizationRole::User));
        assert!(claims.roles.contains(&OrganizationRole::NoAccess));
    }

    #[test]
    fn test_default_role_always_included() {
        let parser = RoleClaimParser::new(PREFIX);
        let claims = parser.parse(["SR-TEST-TENANT:DIS_ORG:ENTRY_ONLY"]).unwrap();
        assert_eq!(claims.roles.len(), 2);
        assert!(claims.roles.contains(&OrganizationRole::NoAccess));
    }

    #[test]
    fn test_parse_claims_rejects_multiple_organizations() {
        let parser = RoleClaimParser::new(PREFIX);
        let claims = parser.parse([
            "SR-TEST-TENANT:DIS_ORG:USER",
            "SR-TEST-TENANT:DAT_ORG:USER",
        ]);
        assert!(claims.is_none());
    }

    #[test]
    fn test_parse_claims_without_organization() {
        let parser = RoleClaimParser::new(PREFIX);
        assert!(parser.parse(["Everyone"]).is_none());
    }

    #[test]
    fn test_claims_with_facilities() {
        let facility = Uuid::new_v4();
        let claims = OrganizationRoleClaims::new("DIS_ORG", [OrganizationRole::User])
            .with_facilities([facility]);
        assert!(claims.facilities.contains(&facility));
        assert!(!claims.grants_all_facility_access());
    }
}
