//! Error types for the Keycloak admin API client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Transient;

/// Failures talking to the Keycloak admin API
#[derive(Debug, Error)]
pub enum IssuerError {
    /// The realm discovery document was unreachable or incomplete
    #[error("OpenID discovery failed for '{realm_url}': {reason}")]
    Discovery { realm_url: String, reason: String },

    /// The client-credentials exchange was rejected
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchange { status: StatusCode, body: String },

    /// Keycloak answered with a non-success status
    #[error("keycloak returned status {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// Transport-level failure (connect, timeout, TLS, body decode)
    #[error("keycloak request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Transient for IssuerError {
    fn is_transient(&self) -> bool {
        match self {
            IssuerError::Http(_) => true,
            IssuerError::Api { status, .. } => status.is_server_error(),
            IssuerError::Discovery { .. } | IssuerError::TokenExchange { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let err = IssuerError::Api {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_permanent() {
        let err = IssuerError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_setup_errors_are_permanent() {
        let err = IssuerError::Discovery {
            realm_url: "https://sso.example.com/realms/apps".to_string(),
            reason: "token_endpoint missing".to_string(),
        };
        assert!(!err.is_transient());
    }
}
