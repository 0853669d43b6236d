//! Required permissions for one protected schema element.

use std::collections::BTreeSet;

use crate::permission::UserPermission;

/// The permissions required to read or supply one schema element.
///
/// A caller satisfies the set when it holds every permission in the ALL-of
/// set and at least one permission of every ANY-of clause. A set with no
/// requirements is satisfied by everyone.
///
/// Built once at wiring time and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    all_of: BTreeSet<UserPermission>,
    any_of_clauses: BTreeSet<BTreeSet<UserPermission>>,
}

impl PermissionSet {
    /// Creates an empty (always satisfied) permission set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds permissions to the ALL-of requirement.
    #[must_use]
    pub fn with_all_of(mut self, permissions: impl IntoIterator<Item = UserPermission>) -> Self {
        self.all_of.extend(permissions);
        self
    }

    /// Adds one ANY-of clause.
    #[must_use]
    pub fn with_any_of(mut self, permissions: impl IntoIterator<Item = UserPermission>) -> Self {
        self.any_of_clauses.insert(permissions.into_iter().collect());
        self
    }

    /// Permissions that must all be held.
    #[must_use]
    pub fn all_of(&self) -> &BTreeSet<UserPermission> {
        &self.all_of
    }

    /// The ANY-of clauses in reduced form.
    ///
    /// A clause that contains another clause is dropped: holding one of
    /// `[A, B]` already implies holding one of `[A, B, C]`. Clauses are visited
    /// smallest first and kept only if no already-kept clause is a subset of
    /// them.
    #[must_use]
    pub fn any_of_clauses(&self) -> Vec<&BTreeSet<UserPermission>> {
        let mut candidates: Vec<_> = self.any_of_clauses.iter().collect();
        candidates.sort_by_key(|clause| clause.len());

        let mut reduced: Vec<&BTreeSet<UserPermission>> = Vec::with_capacity(candidates.len());
        for clause in candidates {
            if !reduced.iter().any(|kept| kept.is_subset(clause)) {
                reduced.push(clause);
            }
        }
        reduced
    }

    /// Returns `true` if nothing is required.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.all_of.is_empty() && self.any_of_clauses.is_empty()
    }

    /// Returns `true` if `held` satisfies every requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, held: &BTreeSet<UserPermission>) -> bool {
        self.all_of.is_subset(held)
            && self
                .any_of_clauses()
                .into_iter()
                .all(|clause| !clause.is_disjoint(held))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use UserPermission::*;

    fn set(permissions: &[UserPermission]) -> BTreeSet<UserPermission> {
        permissions.iter().copied().collect()
    }

    #[test]
    fn test_empty_set_is_unrestricted() {
        let required = PermissionSet::new();
        assert!(required.is_unrestricted());
        assert!(required.is_satisfied_by(&BTreeSet::new()));
    }

    #[test]
    fn test_all_of_is_union() {
        let required = PermissionSet::new()
            .with_all_of([SearchPatients, EditPatient])
            .with_all_of([EditPatient, ManageUsers]);

        assert_eq!(
            required.all_of(),
            &set(&[SearchPatients, EditPatient, ManageUsers])
        );
        assert!(required.any_of_clauses().is_empty());
    }

    #[test]
    fn test_duplicate_clauses_coalesce() {
        let required = PermissionSet::new()
            .with_any_of([EditPatient, ArchivePatient])
            .with_any_of([ArchivePatient, EditPatient]);

        assert_eq!(required.any_of_clauses().len(), 1);
    }

    #[test]
    fn test_superset_clause_is_reduced() {
        let required = PermissionSet::new()
            .with_any_of([ReadPatientList, SearchPatients, ReadResultList])
            .with_any_of([ReadPatientList, SearchPatients]);

        let clauses = required.any_of_clauses();
        assert_eq!(clauses, vec![&set(&[ReadPatientList, SearchPatients])]);
        assert!(required.is_satisfied_by(&set(&[SearchPatients])));
    }

    #[test]
    fn test_disjoint_clauses_are_kept() {
        let required = PermissionSet::new()
            .with_any_of([StartTest, UpdateTest])
            .with_any_of([EditFacility, EditOrganization]);

        assert_eq!(required.any_of_clauses().len(), 2);
    }

    #[test]
    fn test_overlapping_clauses_are_kept() {
        // Neither clause contains the other
        let required = PermissionSet::new()
            .with_any_of([StartTest, UpdateTest])
            .with_any_of([UpdateTest, SubmitTest]);

        assert_eq!(required.any_of_clauses().len(), 2);
    }

    #[test]
    fn test_reduction_chains_through_sizes() {
        let required = PermissionSet::new()
            .with_any_of([StartTest, UpdateTest, SubmitTest])
            .with_any_of([StartTest])
            .with_any_of([StartTest, UpdateTest])
            .with_any_of([EditPatient, ArchivePatient]);

        let clauses = required.any_of_clauses();
        assert_eq!(clauses.len(), 2);
        assert!(clauses.contains(&&set(&[StartTest])));
        assert!(clauses.contains(&&set(&[EditPatient, ArchivePatient])));
    }

    #[test]
    fn test_empty_clause_absorbs_others_and_is_unsatisfiable() {
        let required = PermissionSet::new()
            .with_any_of([] as [UserPermission; 0])
            .with_any_of([StartTest]);

        assert_eq!(required.any_of_clauses(), vec![&BTreeSet::<UserPermission>::new()]);
        assert!(!required.is_satisfied_by(&set(&UserPermission::ALL)));
    }

    #[test]
    fn test_is_satisfied_by() {
        let required = PermissionSet::new()
            .with_all_of([SearchPatients])
            .with_any_of([EditPatient, ArchivePatient]);

        assert!(required.is_satisfied_by(&set(&[SearchPatients, EditPatient])));
        assert!(!required.is_satisfied_by(&set(&[SearchPatients])));
        assert!(!required.is_satisfied_by(&set(&[EditPatient])));
    }
}
