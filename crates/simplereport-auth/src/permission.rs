//! User permissions and the organization roles that grant them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

// ============================================================================
// User Permission
// ============================================================================

/// A capability a user may hold within an organization.
///
/// The set is closed; names round-trip through [`fmt::Display`] and
/// [`FromStr`] in their `SCREAMING_SNAKE_CASE` form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserPermission {
    ReadPatientList,
    ReadArchivedPatientList,
    SearchPatients,
    ReadResultList,
    EditPatient,
    ArchivePatient,
    EditFacility,
    EditOrganization,
    ManageUsers,
    StartTest,
    UpdateTest,
    SubmitTest,
    AccessAllFacilities,
}

impl UserPermission {
    /// Every permission, in declaration order.
    pub const ALL: [UserPermission; 13] = [
        Self::ReadPatientList,
        Self::ReadArchivedPatientList,
        Self::SearchPatients,
        Self::ReadResultList,
        Self::EditPatient,
        Self::ArchivePatient,
        Self::EditFacility,
        Self::EditOrganization,
        Self::ManageUsers,
        Self::StartTest,
        Self::UpdateTest,
        Self::SubmitTest,
        Self::AccessAllFacilities,
    ];

    /// Returns the canonical name of the permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadPatientList => "READ_PATIENT_LIST",
            Self::ReadArchivedPatientList => "READ_ARCHIVED_PATIENT_LIST",
            Self::SearchPatients => "SEARCH_PATIENTS",
            Self::ReadResultList => "READ_RESULT_LIST",
            Self::EditPatient => "EDIT_PATIENT",
            Self::ArchivePatient => "ARCHIVE_PATIENT",
            Self::EditFacility => "EDIT_FACILITY",
            Self::EditOrganization => "EDIT_ORGANIZATION",
            Self::ManageUsers => "MANAGE_USERS",
            Self::StartTest => "START_TEST",
            Self::UpdateTest => "UPDATE_TEST",
            Self::SubmitTest => "SUBMIT_TEST",
            Self::AccessAllFacilities => "ACCESS_ALL_FACILITIES",
        }
    }
}

impl fmt::Display for UserPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserPermission {
    type Err = AuthError;

    /// Parse a permission from its canonical name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownPermission` if the name is not recognized.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| AuthError::unknown_permission(s))
    }
}

// ============================================================================
// Organization Role
// ============================================================================

/// A role a user holds within an organization.
///
/// Roles are listed from lowest to highest precedence; the derived `Ord`
/// follows that order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationRole {
    /// Member of the organization with no granted permissions.
    NoAccess,
    /// May conduct tests and search for patients.
    EntryOnly,
    /// Standard user.
    User,
    /// Organization administrator; holds every permission.
    Admin,
}

impl OrganizationRole {
    /// Every role, lowest precedence first.
    pub const ALL: [OrganizationRole; 4] =
        [Self::NoAccess, Self::EntryOnly, Self::User, Self::Admin];

    /// The role every organization member holds.
    #[must_use]
    pub const fn default_role() -> Self {
        Self::NoAccess
    }

    /// Returns the canonical name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAccess => "NO_ACCESS",
            Self::EntryOnly => "ENTRY_ONLY",
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Human-readable description of the role.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoAccess => "Member",
            Self::EntryOnly => "Test-entry user",
            Self::User => "User",
            Self::Admin => "Admin user",
        }
    }

    /// Permissions granted by this role alone.
    #[must_use]
    pub fn granted_permissions(&self) -> BTreeSet<UserPermission> {
        use UserPermission::*;

        match self {
            Self::NoAccess => BTreeSet::new(),
            Self::EntryOnly => [StartTest, UpdateTest, SubmitTest, SearchPatients]
                .into_iter()
                .collect(),
            Self::User => [
                ReadPatientList,
                ReadResultList,
                EditPatient,
                ArchivePatient,
                StartTest,
                UpdateTest,
                SubmitTest,
                SearchPatients,
            ]
            .into_iter()
            .collect(),
            Self::Admin => UserPermission::ALL.into_iter().collect(),
        }
    }
}

impl Default for OrganizationRole {
    fn default() -> Self {
        Self::default_role()
    }
}

impl fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrganizationRole {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthError::unknown_role(s))
    }
}

// ============================================================================
// Permission Holder
// ============================================================================

/// Something that holds organization roles.
///
/// Implementors only supply [`PermissionHolder::roles`]; permission and
/// facility-scope answers derive from it.
pub trait PermissionHolder {
    /// The roles held.
    fn roles(&self) -> &BTreeSet<OrganizationRole>;

    /// The highest-precedence role held, if any.
    fn effective_role(&self) -> Option<OrganizationRole> {
        self.roles().iter().max().copied()
    }

    /// Union of the permissions granted by every held role.
    fn granted_permissions(&self) -> BTreeSet<UserPermission> {
        self.roles()
            .iter()
            .flat_map(OrganizationRole::granted_permissions)
            .collect()
    }

    /// Whether the held roles grant access to every facility of the organization.
    fn grants_all_facility_access(&self) -> bool {
        self.granted_permissions()
            .contains(&UserPermission::AccessAllFacilities)
    }
}

impl PermissionHolder for BTreeSet<OrganizationRole> {
    fn roles(&self) -> &BTreeSet<OrganizationRole> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_names_round_trip() {
        for permission in UserPermission::ALL {
            assert_eq!(
                permission.as_str().parse::<UserPermission>().unwrap(),
                permission
            );
        }
    }

    #[test]
    fn test_unknown_permission_name() {
        let err = "DELETE_EVERYTHING".parse::<UserPermission>().unwrap_err();
        assert!(matches!(err, AuthError::UnknownPermission { ref name } if name == "DELETE_EVERYTHING"));
        // Names are case-sensitive
        assert!("search_patients".parse::<UserPermission>().is_err());
    }

    #[test]
    fn test_permission_serde_uses_canonical_names() {
        let json = serde_json::to_string(&UserPermission::ReadArchivedPatientList).unwrap();
        assert_eq!(json, "\"READ_ARCHIVED_PATIENT_LIST\"");

        let parsed: UserPermission = serde_json::from_str("\"SUBMIT_TEST\"").unwrap();
        assert_eq!(parsed, UserPermission::SubmitTest);
    }

    #[test]
    fn test_entry_only_grants() {
        let expected: BTreeSet<_> = [
            UserPermission::StartTest,
            UserPermission::SubmitTest,
            UserPermission::UpdateTest,
            UserPermission::SearchPatients,
        ]
        .into_iter()
        .collect();
        assert_eq!(OrganizationRole::EntryOnly.granted_permissions(), expected);
    }

    #[test]
    fn test_admin_grants_everything() {
        assert_eq!(
            OrganizationRole::Admin.granted_permissions().len(),
            UserPermission::ALL.len()
        );
        assert!(OrganizationRole::NoAccess.granted_permissions().is_empty());
    }

    #[test]
    fn test_user_role_cannot_manage() {
        let granted = OrganizationRole::User.granted_permissions();
        assert!(granted.contains(&UserPermission::EditPatient));
        assert!(!granted.contains(&UserPermission::ManageUsers));
        assert!(!granted.contains(&UserPermission::ReadArchivedPatientList));
        assert!(!granted.contains(&UserPermission::AccessAllFacilities));
    }

    #[test]
    fn test_role_names_round_trip() {
        for role in OrganizationRole::ALL {
            assert_eq!(role.as_str().parse::<OrganizationRole>().unwrap(), role);
        }
        assert!("OWNER".parse::<OrganizationRole>().is_err());
        assert_eq!(OrganizationRole::default(), OrganizationRole::NoAccess);
    }

    #[test]
    fn test_permission_holder_effective_role() {
        let roles: BTreeSet<_> = [OrganizationRole::NoAccess, OrganizationRole::User]
            .into_iter()
            .collect();
        assert_eq!(roles.effective_role(), Some(OrganizationRole::User));
        assert_eq!(
            roles.granted_permissions(),
            OrganizationRole::User.granted_permissions()
        );
        assert!(!roles.grants_all_facility_access());

        let empty = BTreeSet::new();
        assert_eq!(empty.effective_role(), None);
    }

    #[test]
    fn test_admin_grants_all_facility_access() {
        let roles: BTreeSet<_> = [OrganizationRole::Admin].into_iter().collect();
        assert!(roles.grants_all_facility_access());
    }
}
