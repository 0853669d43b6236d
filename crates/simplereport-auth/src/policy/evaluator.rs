//! Access evaluation.
//!
//! [`AccessEvaluator`] is a pure function of a [`PermissionSet`], the caller's
//! [`Subject`] and the [`AccessTarget`] being resolved. Denials are logged with
//! the full permission gap so they can be audited server-side.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{info, trace};

use crate::permission::UserPermission;
use crate::policy::permission_set::PermissionSet;
use crate::subject::Subject;

// =============================================================================
// Access Target
// =============================================================================

/// The schema element a caller is trying to read or supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTarget {
    /// A field at a path in the response tree.
    Field {
        /// Response path, e.g. `organization.facilities.0.name`.
        path: String,
        /// Whether the field's declared type is non-nullable.
        non_null: bool,
    },
    /// An argument supplied to the field at `path`.
    Argument {
        /// Argument name.
        name: String,
        /// Response path of the field receiving the argument.
        path: String,
    },
}

impl AccessTarget {
    /// Creates a field target.
    #[must_use]
    pub fn field(path: impl Into<String>, non_null: bool) -> Self {
        Self::Field {
            path: path.into(),
            non_null,
        }
    }

    /// Creates an argument target.
    #[must_use]
    pub fn argument(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Argument {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Response path of the target.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Field { path, .. } | Self::Argument { path, .. } => path,
        }
    }
}

impl fmt::Display for AccessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { path, .. } => write!(f, "{path}"),
            Self::Argument { name, path } => write!(f, "{path}({name})"),
        }
    }
}

// =============================================================================
// Access Decision
// =============================================================================

/// Result of access evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is granted.
    Allow,
    /// Access is denied with a reason.
    Deny(DenyReason),
}

impl AccessDecision {
    /// Returns `true` if access was granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns `true` if access was denied.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    /// Get the deny reason if access was denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow => None,
        }
    }
}

/// Why access was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum DenyReason {
    /// The request carried no authenticated subject.
    MissingSubject,
    /// Some ALL-of permissions are not held.
    #[serde(rename_all = "camelCase")]
    MissingAllOf {
        /// The required permissions that are not held.
        missing_permissions: BTreeSet<UserPermission>,
    },
    /// No permission of an ANY-of clause is held.
    #[serde(rename_all = "camelCase")]
    UnsatisfiedAnyOf {
        /// The clause with no held member.
        clause: BTreeSet<UserPermission>,
    },
}

impl DenyReason {
    /// Error code for programmatic handling.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSubject => "missing-subject",
            Self::MissingAllOf { .. } => "missing-all-of",
            Self::UnsatisfiedAnyOf { .. } => "unsatisfied-any-of",
        }
    }

    /// Structured details of the permission gap.
    #[must_use]
    pub fn details(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSubject => write!(f, "no authenticated subject"),
            Self::MissingAllOf {
                missing_permissions,
            } => write!(f, "missing all of {}", PermissionList(missing_permissions)),
            Self::UnsatisfiedAnyOf { clause } => {
                write!(f, "missing at least one of {}", PermissionList(clause))
            }
        }
    }
}

/// Renders a permission set as `[A, B]`.
struct PermissionList<'a>(&'a BTreeSet<UserPermission>);

impl fmt::Display for PermissionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, permission) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{permission}")?;
        }
        write!(f, "]")
    }
}

// =============================================================================
// Access Evaluator
// =============================================================================

/// Decides whether a subject satisfies a permission set.
///
/// Stateless; evaluation order is site-admin bypass, ALL-of check, then each
/// reduced ANY-of clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessEvaluator;

impl AccessEvaluator {
    /// Evaluates access for `target`.
    ///
    /// A missing subject is denied. Site administrators are always allowed.
    #[must_use]
    pub fn evaluate(
        &self,
        required: &PermissionSet,
        subject: Option<&Subject>,
        target: &AccessTarget,
    ) -> AccessDecision {
        let Some(subject) = subject else {
            info!(target_path = %target, "No subject on request; denying access");
            return AccessDecision::Deny(DenyReason::MissingSubject);
        };

        if subject.is_site_admin() {
            trace!(
                user = %subject.username(),
                target_path = %target,
                "Site admin bypasses permission check"
            );
            return AccessDecision::Allow;
        }

        let held = subject.permissions();

        if !required.all_of().is_subset(held) {
            let missing_permissions: BTreeSet<_> =
                required.all_of().difference(held).copied().collect();
            info!(
                user = %subject.username(),
                target_path = %target,
                "User does not have all of {}; denying access",
                PermissionList(required.all_of())
            );
            return AccessDecision::Deny(DenyReason::MissingAllOf {
                missing_permissions,
            });
        }

        for clause in required.any_of_clauses() {
            if clause.is_disjoint(held) {
                info!(
                    user = %subject.username(),
                    target_path = %target,
                    "User does not have at least one of {}; denying access",
                    PermissionList(clause)
                );
                return AccessDecision::Deny(DenyReason::UnsatisfiedAnyOf {
                    clause: clause.clone(),
                });
            }
        }

        trace!(user = %subject.username(), target_path = %target, "Access allowed");
        AccessDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::SubjectBuilder;
    use UserPermission::*;

    fn subject_with(permissions: &[UserPermission]) -> Subject {
        SubjectBuilder::new("tester@example.com")
            .with_permissions(permissions.iter().copied())
            .build()
    }

    fn site_admin() -> Subject {
        SubjectBuilder::new("admin@simplereport.gov")
            .site_admin(true)
            .build()
    }

    fn target() -> AccessTarget {
        AccessTarget::field("patients", false)
    }

    fn evaluate(required: &PermissionSet, subject: &Subject) -> AccessDecision {
        AccessEvaluator.evaluate(required, Some(subject), &target())
    }

    #[test]
    fn test_site_admin_bypasses_everything() {
        let restrictive = PermissionSet::new()
            .with_all_of(UserPermission::ALL)
            .with_any_of([] as [UserPermission; 0]);

        assert!(evaluate(&restrictive, &site_admin()).is_allowed());
        assert!(
            AccessEvaluator
                .evaluate(
                    &restrictive,
                    Some(&site_admin()),
                    &AccessTarget::argument("includeArchived", "patients")
                )
                .is_allowed()
        );
    }

    #[test]
    fn test_empty_requirement_allows_everyone() {
        assert!(evaluate(&PermissionSet::new(), &subject_with(&[])).is_allowed());
    }

    #[test]
    fn test_missing_subject_is_denied() {
        let decision = AccessEvaluator.evaluate(&PermissionSet::new(), None, &target());
        assert_eq!(decision, AccessDecision::Deny(DenyReason::MissingSubject));
    }

    #[test]
    fn test_all_of_is_conjunctive() {
        let required = PermissionSet::new().with_all_of([EditFacility, EditOrganization]);

        let decision = evaluate(&required, &subject_with(&[EditFacility]));
        assert_eq!(
            decision,
            AccessDecision::Deny(DenyReason::MissingAllOf {
                missing_permissions: [EditOrganization].into_iter().collect(),
            })
        );

        assert!(evaluate(&required, &subject_with(&[EditFacility, EditOrganization])).is_allowed());
        assert!(
            evaluate(
                &required,
                &subject_with(&[EditFacility, EditOrganization, ManageUsers])
            )
            .is_allowed()
        );
    }

    #[test]
    fn test_any_of_clauses_are_conjunctive() {
        let required = PermissionSet::new()
            .with_any_of([StartTest, UpdateTest])
            .with_any_of([EditFacility, EditOrganization]);

        let decision = evaluate(&required, &subject_with(&[StartTest]));
        assert_eq!(
            decision.deny_reason(),
            Some(&DenyReason::UnsatisfiedAnyOf {
                clause: [EditFacility, EditOrganization].into_iter().collect(),
            })
        );

        assert!(evaluate(&required, &subject_with(&[StartTest, EditFacility])).is_allowed());
    }

    #[test]
    fn test_reduced_clause_does_not_require_extra_permission() {
        let required = PermissionSet::new()
            .with_any_of([StartTest, UpdateTest])
            .with_any_of([StartTest, UpdateTest, SubmitTest]);

        assert!(evaluate(&required, &subject_with(&[StartTest, UpdateTest])).is_allowed());
    }

    #[test]
    fn test_search_with_edit_or_archive_scenario() {
        let required = PermissionSet::new()
            .with_all_of([SearchPatients])
            .with_any_of([EditPatient, ArchivePatient]);

        assert!(evaluate(&required, &subject_with(&[SearchPatients, EditPatient])).is_allowed());

        let no_clause = evaluate(&required, &subject_with(&[SearchPatients]));
        assert_eq!(
            no_clause.deny_reason().map(DenyReason::code),
            Some("unsatisfied-any-of")
        );

        let no_all_of = evaluate(&required, &subject_with(&[EditPatient]));
        assert_eq!(
            no_all_of.deny_reason().map(DenyReason::code),
            Some("missing-all-of")
        );
    }

    #[test]
    fn test_deny_reason_display_and_details() {
        let reason = DenyReason::MissingAllOf {
            missing_permissions: [ManageUsers, EditFacility].into_iter().collect(),
        };
        assert_eq!(
            reason.to_string(),
            "missing all of [EDIT_FACILITY, MANAGE_USERS]"
        );
        assert_eq!(
            reason.details(),
            serde_json::json!({
                "reason": "missing-all-of",
                "missingPermissions": ["EDIT_FACILITY", "MANAGE_USERS"]
            })
        );

        let clause = DenyReason::UnsatisfiedAnyOf {
            clause: [StartTest].into_iter().collect(),
        };
        assert_eq!(clause.to_string(), "missing at least one of [START_TEST]");
    }

    #[test]
    fn test_access_target_display() {
        assert_eq!(
            AccessTarget::field("organization.name", true).to_string(),
            "organization.name"
        );
        let argument = AccessTarget::argument("includeArchived", "patients");
        assert_eq!(argument.to_string(), "patients(includeArchived)");
        assert_eq!(argument.path(), "patients");
    }
}
