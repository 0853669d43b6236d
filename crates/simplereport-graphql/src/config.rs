//! GraphQL configuration.
//!
//! Configuration can be specified in `simplereport.toml` under the
//! `[graphql]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = false
//! expose_denial_details = false
//! ```

use async_graphql::dynamic::SchemaBuilder;
use serde::{Deserialize, Serialize};

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true (development-friendly)
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Include the denial reason and the missing or unsatisfied permissions
    /// in access-denied error extensions.
    /// When disabled the permission gap is only written to the server log.
    /// Default: false
    #[serde(default)]
    pub expose_denial_details: bool,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            expose_denial_details: false,
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        Ok(())
    }

    /// Applies the query limits and introspection setting to a schema builder.
    #[must_use]
    pub fn apply(&self, builder: SchemaBuilder) -> SchemaBuilder {
        let builder = builder
            .limit_depth(self.max_depth)
            .limit_complexity(self.max_complexity);

        if self.introspection {
            builder
        } else {
            builder.disable_introspection()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert!(!config.expose_denial_details);
    }

    #[test]
    fn test_valid_config() {
        assert!(GraphQLConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        let mut config = GraphQLConfig::default();
        config.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = GraphQLConfig::default();
        config.max_complexity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            max_depth = 20
            introspection = false
            expose_denial_details = true
        "#;

        let config: GraphQLConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 500);
        assert!(!config.introspection);
        assert!(config.expose_denial_details);
    }
}
