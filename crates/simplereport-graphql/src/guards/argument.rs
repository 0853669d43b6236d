//! Argument guard.
//!
//! Supplying no value, `null`, or the declared default never requires a
//! permission. Any other value is checked before the wrapped resolver runs.
//! The default is compared after input coercion for the declared type, so
//! `1` matches a `Float` default of `1.0` and `"A"` matches a list default
//! of `["A"]`.
//!
//! A denial surfaces like a field denial: the field resolves to `null` with
//! the argument error at its path, or nulls its nearest nullable ancestor
//! when it is non-nullable.

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::TypeRef;
use simplereport_auth::{AccessDecision, AccessEvaluator, AccessTarget, PermissionSet, Subject};
use tracing::trace;

use super::{DenialMode, ResolverFn, current_path, current_subject, reject, resolver_fn};
use crate::error::AccessDeniedError;
use crate::schema::registry::ArgumentDefinitionInfo;

/// Gates a caller-supplied value for one argument.
#[derive(Debug, Clone)]
pub struct ArgumentGuard {
    name: String,
    ty: TypeRef,
    default_value: Option<Value>,
    permissions: Arc<PermissionSet>,
    mode: DenialMode,
    expose_details: bool,
    evaluator: AccessEvaluator,
}

impl ArgumentGuard {
    /// Creates a guard for the argument `name` of declared type `ty`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ty: TypeRef,
        default_value: Option<Value>,
        permissions: Arc<PermissionSet>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value,
            permissions,
            mode: DenialMode::NullWithError,
            expose_details: false,
            evaluator: AccessEvaluator,
        }
    }

    /// Creates a guard from a gated argument definition.
    ///
    /// Returns `None` if the argument is not gated.
    #[must_use]
    pub fn for_definition(argument: &ArgumentDefinitionInfo) -> Option<Self> {
        argument.permissions.clone().map(|permissions| {
            Self::new(
                argument.name.clone(),
                argument.ty.clone(),
                argument.default_value.clone(),
                permissions,
            )
        })
    }

    /// Sets how a denial surfaces, from the nullability of the field taking
    /// the argument.
    #[must_use]
    pub fn with_mode(mut self, mode: DenialMode) -> Self {
        self.mode = mode;
        self
    }

    /// Includes the permission gap in client-facing errors.
    #[must_use]
    pub fn with_exposed_details(mut self, expose_details: bool) -> Self {
        self.expose_details = expose_details;
        self
    }

    /// Argument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if `supplied` has to be checked.
    #[must_use]
    pub fn is_enforced(&self, supplied: Option<&Value>) -> bool {
        match (supplied, &self.default_value) {
            (None | Some(Value::Null), _) => false,
            (Some(value), Some(default)) => !coerced_eq(&self.ty, value, default),
            (Some(_), None) => true,
        }
    }

    /// Checks a supplied value against the argument's permissions.
    ///
    /// # Errors
    ///
    /// Returns the access-denied error naming the argument.
    pub fn check(
        &self,
        supplied: Option<&Value>,
        subject: Option<&Subject>,
        path: &str,
    ) -> Result<(), AccessDeniedError> {
        if !self.is_enforced(supplied) {
            trace!(argument = %self.name, path = %path, "Default argument value; not enforced");
            return Ok(());
        }

        let target = AccessTarget::argument(&self.name, path);
        match self.evaluator.evaluate(&self.permissions, subject, &target) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => Err(AccessDeniedError::Argument {
                name: self.name.clone(),
                path: path.to_string(),
                reason,
            }),
        }
    }

    /// Wraps `inner` so it only runs when the check passes.
    #[must_use]
    pub fn wrap(self, inner: ResolverFn) -> ResolverFn {
        let guard = Arc::new(self);

        resolver_fn(move |ctx| {
            let supplied = ctx.args.get(&guard.name).map(|value| value.as_value().clone());
            let path = current_path(&ctx);
            let checked = guard.check(supplied.as_ref(), current_subject(&ctx), &path);

            match checked {
                Ok(()) => (*inner)(ctx),
                Err(denied) => reject(
                    &ctx,
                    guard.mode,
                    denied.into_graphql_error(guard.expose_details),
                ),
            }
        })
    }
}

/// Compares two input values as the engine would after coercing both to `ty`.
fn coerced_eq(ty: &TypeRef, left: &Value, right: &Value) -> bool {
    match ty {
        TypeRef::NonNull(inner) => coerced_eq(inner, left, right),
        TypeRef::List(item) => match (left, right) {
            (Value::List(left), Value::List(right)) => {
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right)
                        .all(|(left, right)| coerced_eq(item, left, right))
            }
            (Value::List(list), single) | (single, Value::List(list)) => {
                matches!(list.as_slice(), [only] if coerced_eq(item, only, single))
            }
            (left, right) => coerced_eq(item, left, right),
        },
        TypeRef::Named(name) if name == TypeRef::FLOAT => match (left, right) {
            (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
            _ => left == right,
        },
        TypeRef::Named(_) => same_value(left, right),
    }
}

/// Structural equality that accepts an enum literal for its string name.
fn same_value(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Enum(name), Value::String(text)) | (Value::String(text), Value::Enum(name)) => {
            name.as_str() == text
        }
        (Value::List(left), Value::List(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(left, right)| same_value(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, value)| {
                    right
                        .get(key)
                        .is_some_and(|other| same_value(value, other))
                })
        }
        _ => left == right,
    }
}
