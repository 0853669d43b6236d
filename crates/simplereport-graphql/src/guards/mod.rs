//! Permission guards around dynamic-schema resolvers.
//!
//! - [`FieldGuard`]: gates a field's resolution
//! - [`ArgumentGuard`]: gates a caller-supplied argument value
//! - [`SelectionGuard`]: resolves a nullable field to `null` when a
//!   non-nullable field below it would be denied
//!
//! Guards evaluate synchronously and finish before the wrapped resolver's
//! future is created.

mod argument;
mod field;
mod selection;

pub use argument::ArgumentGuard;
pub use field::{DenialMode, FieldGuard};
pub use selection::SelectionGuard;

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use simplereport_auth::Subject;
use tracing::warn;

use crate::context::GraphQLContext;

/// A shareable dynamic-schema resolver.
pub type ResolverFn = Arc<dyn for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync>;

/// Erases a resolver closure into a [`ResolverFn`].
pub fn resolver_fn<F>(resolver: F) -> ResolverFn
where
    F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
{
    Arc::new(resolver)
}

/// Helper to extract the caller's subject from resolver context.
pub(crate) fn current_subject<'a>(ctx: &ResolverContext<'a>) -> Option<&'a Subject> {
    ctx.data_opt::<GraphQLContext>()
        .and_then(GraphQLContext::subject)
}

/// Response path of the field being resolved.
pub(crate) fn current_path(ctx: &ResolverContext<'_>) -> String {
    ctx.path_node
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Records `error` at the current field's path and resolves to no value.
///
/// A nullable field becomes `null`. A non-nullable field should never get
/// here: the [`SelectionGuard`] of its nearest nullable ancestor denies first.
/// If it does, the engine reports the missing value as well.
pub(crate) fn reject<'a>(
    ctx: &ResolverContext<'a>,
    mode: DenialMode,
    error: async_graphql::Error,
) -> FieldFuture<'a> {
    if mode == DenialMode::Raise {
        warn!(
            path = %current_path(ctx),
            "Denied non-null field has no guarded nullable ancestor"
        );
    }

    ctx.add_error(ctx.set_error_path(error.into_server_error(ctx.item.pos)));
    FieldFuture::from_value(None)
}
