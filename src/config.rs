//! # Job Configuration
//!
//! Process-wide configuration loaded once from environment variables and
//! passed explicitly into the client constructors.
//!
//! All credential material is zeroized when the config is dropped.

use anyhow::{Context, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{DEFAULT_EXPIRATION_DAYS, DEFAULT_MAX_CLIENT_COUNT};

/// Immutable configuration for a single sync run
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Config {
    /// Uses granted to a newly created initial access token
    pub max_client_count: u32,
    /// Validity window of a newly created initial access token (days)
    pub expiration_days: u32,

    /// Keycloak base URL, e.g. `https://sso.example.com`
    pub keycloak_url: String,
    /// Realm the initial access token belongs to
    pub keycloak_realm: String,
    /// Service account client id for the client-credentials grant
    pub keycloak_client_id: String,
    pub keycloak_client_secret: String,

    /// Vault base URL, e.g. `https://vault.example.com`
    pub vault_url: String,
    /// Approle credentials for Vault authentication
    pub vault_approle_role_id: String,
    pub vault_approle_secret_id: String,
    /// Slash-delimited secret path; the first segment names the KV mount
    pub vault_secret_path: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("max_client_count", &self.max_client_count)
            .field("expiration_days", &self.expiration_days)
            .field("keycloak_url", &self.keycloak_url)
            .field("keycloak_realm", &self.keycloak_realm)
            .field("keycloak_client_id", &self.keycloak_client_id)
            .field("vault_url", &self.vault_url)
            .field("vault_secret_path", &self.vault_secret_path)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a required one is unset.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            max_client_count: env_var_or_default("MAX_CLIENT_COUNT", DEFAULT_MAX_CLIENT_COUNT),
            expiration_days: env_var_or_default("EXPIRATION_DAYS", DEFAULT_EXPIRATION_DAYS),
            keycloak_url: required_env("KEYCLOAK_URL")?,
            keycloak_realm: required_env("KEYCLOAK_REALM")?,
            keycloak_client_id: required_env("KEYCLOAK_CLIENT_ID")?,
            keycloak_client_secret: required_env("KEYCLOAK_CLIENT_SECRET")?,
            vault_url: required_env("VAULT_ADDR")?,
            vault_approle_role_id: required_env("VAULT_APPROLE_ROLE_ID")?,
            vault_approle_secret_id: required_env("VAULT_APPROLE_SECRET_ID")?,
            vault_secret_path: required_env("VAULT_SECRET_PATH")?,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("required environment variable {key} is not set"))
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_default_unset() {
        let value: u32 = env_var_or_default("IAT_SYNC_TEST_UNSET_VAR", 100);
        assert_eq!(value, 100);
    }

    #[test]
    fn test_env_var_or_default_set() {
        std::env::set_var("IAT_SYNC_TEST_COUNT_VAR", "25");
        let value: u32 = env_var_or_default("IAT_SYNC_TEST_COUNT_VAR", 100);
        assert_eq!(value, 25);
    }

    #[test]
    fn test_env_var_or_default_unparsable_falls_back() {
        std::env::set_var("IAT_SYNC_TEST_BAD_VAR", "not-a-number");
        let value: u32 = env_var_or_default("IAT_SYNC_TEST_BAD_VAR", 30);
        assert_eq!(value, 30);
    }

    #[test]
    fn test_required_env_missing_names_variable() {
        let err = required_env("IAT_SYNC_TEST_MISSING_VAR").unwrap_err();
        assert!(err.to_string().contains("IAT_SYNC_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = Config {
            max_client_count: 100,
            expiration_days: 30,
            keycloak_url: "https://sso.example.com".to_string(),
            keycloak_realm: "apps".to_string(),
            keycloak_client_id: "iat-sync".to_string(),
            keycloak_client_secret: "super-secret".to_string(),
            vault_url: "https://vault.example.com".to_string(),
            vault_approle_role_id: "role-id".to_string(),
            vault_approle_secret_id: "secret-id".to_string(),
            vault_secret_path: "secret/keycloak/iat".to_string(),
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("secret-id"));
        assert!(rendered.contains("https://sso.example.com"));
    }
}
