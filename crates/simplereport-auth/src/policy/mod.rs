//! Required-permission sets and access evaluation.
//!
//! # Permission Sets
//!
//! The [`permission_set`] module provides [`PermissionSet`], the requirement
//! attached to one protected schema element:
//!
//! ```ignore
//! use simplereport_auth::policy::PermissionSet;
//! use simplereport_auth::UserPermission::*;
//!
//! let required = PermissionSet::new()
//!     .with_all_of([SearchPatients])
//!     .with_any_of([EditPatient, ArchivePatient]);
//! ```
//!
//! # Evaluation
//!
//! The [`evaluator`] module decides whether a [`crate::Subject`] satisfies a
//! permission set for a given [`AccessTarget`]:
//!
//! ```ignore
//! let decision = AccessEvaluator.evaluate(&required, Some(&subject), &target);
//! if decision.is_allowed() {
//!     // Resolve the field
//! }
//! ```

pub mod evaluator;
pub mod permission_set;

pub use evaluator::{AccessDecision, AccessEvaluator, AccessTarget, DenyReason};
pub use permission_set::PermissionSet;
