//! Authorization configuration.
//!
//! Configuration is read from the `[authorization]` section of the server
//! configuration file.
//!
//! # Example (TOML)
//!
//! ```toml
//! [authorization]
//! role_prefix = "SR-PROD-TENANT:"
//! site_admin_emails = ["admin@simplereport.gov"]
//! ```

use serde::{Deserialize, Serialize};

/// Authorization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Prefix of identity-provider group names that carry organization roles.
    ///
    /// A group named `{role_prefix}{organization_external_id}:{ROLE}` grants
    /// `ROLE` in that organization.
    pub role_prefix: String,

    /// Usernames (emails) of site administrators.
    /// Site administrators bypass every permission gate.
    pub site_admin_emails: Vec<String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            role_prefix: "SR-LOCALDEV-TENANT:".to_string(),
            site_admin_emails: Vec::new(),
        }
    }
}

impl AuthorizationConfig {
    /// Returns `true` if the username belongs to a site administrator.
    ///
    /// Matching is case-insensitive.
    #[must_use]
    pub fn is_site_admin(&self, username: &str) -> bool {
        self.site_admin_emails
            .iter()
            .any(|email| email.eq_ignore_ascii_case(username))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `role_prefix` is empty
    /// - a site admin email is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.role_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "authorization.role_prefix must not be empty".to_string(),
            ));
        }

        if self.site_admin_emails.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "authorization.site_admin_emails must not contain blank entries".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}
