//! The authenticated caller's authorization facts.
//!
//! A [`Subject`] is built once per inbound request from the authenticated
//! identity and its resolved organization role claims, and is immutable
//! afterwards.
//!
//! # Example
//!
//! ```ignore
//! use simplereport_auth::{SubjectBuilder, UserPermission};
//!
//! let subject = SubjectBuilder::new("nurse@example.com")
//!     .with_permissions([UserPermission::SearchPatients])
//!     .build();
//! ```

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::claims::OrganizationRoleClaims;
use crate::config::AuthorizationConfig;
use crate::permission::{OrganizationRole, PermissionHolder, UserPermission};

// =============================================================================
// Facility Access
// =============================================================================

/// Which facilities of the organization the caller may act in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FacilityAccess {
    /// Every facility of the organization.
    All,
    /// Only the listed facilities.
    Only(BTreeSet<Uuid>),
    /// No facility.
    #[default]
    None,
}

impl FacilityAccess {
    /// Returns `true` if the facility is accessible.
    #[must_use]
    pub fn allows(&self, facility_id: &Uuid) -> bool {
        match self {
            Self::All => true,
            Self::Only(facilities) => facilities.contains(facility_id),
            Self::None => false,
        }
    }
}

// =============================================================================
// Subject
// =============================================================================

/// Snapshot of the caller's authorization facts for one request.
#[derive(Debug, Clone)]
pub struct Subject {
    username: String,
    site_admin: bool,
    permissions: BTreeSet<UserPermission>,
    roles: BTreeSet<OrganizationRole>,
    organization: Option<String>,
    facilities: FacilityAccess,
}

impl Subject {
    /// Creates a new builder.
    #[must_use]
    pub fn builder(username: impl Into<String>) -> SubjectBuilder {
        SubjectBuilder::new(username)
    }

    /// Resolves a user and their organization claims into a subject.
    ///
    /// Site administrator status comes from the configuration. A user without
    /// claims holds no permissions.
    #[must_use]
    pub fn from_claims(
        username: &str,
        claims: Option<&OrganizationRoleClaims>,
        config: &AuthorizationConfig,
    ) -> Self {
        let builder = SubjectBuilder::new(username).site_admin(config.is_site_admin(username));

        match claims {
            Some(claims) => builder.with_claims(claims),
            None => builder,
        }
        .build()
    }

    /// Username of the authenticated API user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns `true` if the caller bypasses every permission gate.
    #[must_use]
    pub fn is_site_admin(&self) -> bool {
        self.site_admin
    }

    /// Permissions granted in the current organization.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<UserPermission> {
        &self.permissions
    }

    /// Returns `true` if the caller holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: UserPermission) -> bool {
        self.permissions.contains(&permission)
    }

    /// External id of the organization the caller belongs to.
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Facilities the caller may act in.
    #[must_use]
    pub fn facilities(&self) -> &FacilityAccess {
        &self.facilities
    }

    /// Returns `true` if the caller may act in the facility.
    ///
    /// Site administrators may act in every facility.
    #[must_use]
    pub fn can_access_facility(&self, facility_id: &Uuid) -> bool {
        self.site_admin || self.facilities.allows(facility_id)
    }
}

impl PermissionHolder for Subject {
    fn roles(&self) -> &BTreeSet<OrganizationRole> {
        &self.roles
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for constructing a [`Subject`].
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    username: String,
    site_admin: bool,
    permissions: BTreeSet<UserPermission>,
    roles: BTreeSet<OrganizationRole>,
    organization: Option<String>,
    facilities: FacilityAccess,
}

impl SubjectBuilder {
    /// Creates a builder for the given username.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            site_admin: false,
            permissions: BTreeSet::new(),
            roles: BTreeSet::new(),
            organization: None,
            facilities: FacilityAccess::None,
        }
    }

    /// Sets the site administrator flag.
    #[must_use]
    pub fn site_admin(mut self, site_admin: bool) -> Self {
        self.site_admin = site_admin;
        self
    }

    /// Adds granted permissions.
    #[must_use]
    pub fn with_permissions(
        mut self,
        permissions: impl IntoIterator<Item = UserPermission>,
    ) -> Self {
        self.permissions.extend(permissions);
        self
    }

    /// Sets the organization.
    #[must_use]
    pub fn with_organization(mut self, organization_external_id: impl Into<String>) -> Self {
        self.organization = Some(organization_external_id.into());
        self
    }

    /// Sets facility access.
    #[must_use]
    pub fn with_facilities(mut self, facilities: FacilityAccess) -> Self {
        self.facilities = facilities;
        self
    }

    /// Applies organization role claims: roles, the permissions they grant,
    /// the organization and facility access.
    #[must_use]
    pub fn with_claims(mut self, claims: &OrganizationRoleClaims) -> Self {
        self.permissions.extend(claims.granted_permissions());
        self.roles.extend(claims.roles.iter().copied());
        self.organization = Some(claims.organization_external_id.clone());
        self.facilities = if claims.grants_all_facility_access() {
            FacilityAccess::All
        } else {
            FacilityAccess::Only(claims.facilities.clone())
        };
        self
    }

    /// Builds the subject.
    #[must_use]
    pub fn build(self) -> Subject {
        Subject {
            username: self.username,
            site_admin: self.site_admin,
            permissions: self.permissions,
            roles: self.roles,
            organization: self.organization,
            facilities: self.facilities,
        }
    }
}
