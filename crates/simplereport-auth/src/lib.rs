//! # simplereport-auth
//!
//! Authorization model for the SimpleReport server.
//!
//! This crate provides:
//! - The closed set of user permissions and the organization roles granting them
//! - Organization role claims parsed from identity-provider group names
//! - The per-request [`Subject`] snapshot of a caller's authorization facts
//! - Required-permission sets with ALL-of / ANY-of clauses
//! - The access evaluator deciding whether a subject satisfies a permission set
//!
//! ## Overview
//!
//! Permission requirements are declared on schema elements and gathered once
//! at wiring time into immutable [`PermissionSet`]s. At request time the
//! [`AccessEvaluator`] checks the request's [`Subject`] against them. Denial is
//! a decision, not an error: callers decide how to surface it.
//!
//! ## Modules
//!
//! - [`config`] - Authorization configuration
//! - [`permission`] - User permissions, organization roles, permission holders
//! - [`claims`] - Organization role claims and group-name parsing
//! - [`subject`] - Per-request caller snapshot
//! - [`policy`] - Permission sets and access evaluation
//! - [`error`] - Error types

pub mod claims;
pub mod config;
pub mod error;
pub mod permission;
pub mod policy;
pub mod subject;

pub use claims::{OrganizationRoleClaims, RoleClaimParser};
pub use config::{AuthorizationConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use permission::{OrganizationRole, PermissionHolder, UserPermission};
pub use policy::{AccessDecision, AccessEvaluator, AccessTarget, DenyReason, PermissionSet};
pub use subject::{FacilityAccess, Subject, SubjectBuilder};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use simplereport_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::claims::{OrganizationRoleClaims, RoleClaimParser};
    pub use crate::config::{AuthorizationConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::permission::{OrganizationRole, PermissionHolder, UserPermission};
    pub use crate::policy::{
        AccessDecision, AccessEvaluator, AccessTarget, DenyReason, PermissionSet,
    };
    pub use crate::subject::{FacilityAccess, Subject, SubjectBuilder};
}
