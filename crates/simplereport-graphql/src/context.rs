//! GraphQL execution context.
//!
//! The context is constructed per request and attached with
//! `async_graphql::Request::data`. Guards read the caller's [`Subject`] from it.
//!
//! # Example
//!
//! ```ignore
//! use simplereport_graphql::GraphQLContextBuilder;
//!
//! let context = GraphQLContextBuilder::new()
//!     .with_subject(Some(subject))
//!     .with_request_id("req-123")
//!     .build()?;
//!
//! let response = schema
//!     .execute(async_graphql::Request::new(query).data(context))
//!     .await;
//! ```

use std::sync::Arc;

use simplereport_auth::Subject;

/// GraphQL execution context.
///
/// Request-scoped; the subject is never shared across requests.
#[derive(Debug, Clone)]
pub struct GraphQLContext {
    /// Authorization facts of the caller (None for unauthenticated).
    pub subject: Option<Arc<Subject>>,

    /// Request ID for tracing and correlation.
    pub request_id: String,
}

impl GraphQLContext {
    /// Returns whether the request is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }

    /// Returns the caller's subject, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_deref()
    }

    /// Returns the username if authenticated.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.subject().map(Subject::username)
    }

    /// Creates a new builder for GraphQLContext.
    #[must_use]
    pub fn builder() -> GraphQLContextBuilder {
        GraphQLContextBuilder::default()
    }
}

/// Builder for constructing GraphQLContext.
#[derive(Debug, Default)]
pub struct GraphQLContextBuilder {
    subject: Option<Arc<Subject>>,
    request_id: Option<String>,
}

impl GraphQLContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the caller's subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Option<Subject>) -> Self {
        self.subject = subject.map(Arc::new);
        self
    }

    /// Sets an already shared subject.
    #[must_use]
    pub fn with_shared_subject(mut self, subject: Arc<Subject>) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Builds the GraphQLContext.
    ///
    /// # Errors
    ///
    /// Returns an error if the request ID is missing.
    pub fn build(self) -> Result<GraphQLContext, ContextBuilderError> {
        let request_id = self
            .request_id
            .ok_or(ContextBuilderError::MissingField("request_id"))?;

        Ok(GraphQLContext {
            subject: self.subject,
            request_id,
        })
    }
}

/// Errors that can occur when building a GraphQLContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplereport_auth::SubjectBuilder;

    #[test]
    fn test_builder_missing_request_id() {
        let result = GraphQLContextBuilder::new().with_subject(None).build();

        assert!(matches!(
            result,
            Err(ContextBuilderError::MissingField("request_id"))
        ));
    }

    #[test]
    fn test_unauthenticated_context() {
        let context = GraphQLContext::builder()
            .with_request_id("req-123")
            .build()
            .unwrap();

        assert!(!context.is_authenticated());
        assert!(context.subject().is_none());
        assert_eq!(context.request_id, "req-123");
    }

    #[test]
    fn test_authenticated_context() {
        let subject = SubjectBuilder::new("nurse@example.com").build();
        let context = GraphQLContext::builder()
            .with_subject(Some(subject))
            .with_request_id("req-456")
            .build()
            .unwrap();

        assert!(context.is_authenticated());
        assert_eq!(context.username(), Some("nurse@example.com"));
    }
}
