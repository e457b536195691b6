//! Wire types for OpenID discovery and the client-credentials grant.

use serde::Deserialize;

/// The subset of the realm discovery document the job needs
///
/// `GET {realm_url}/.well-known/openid-configuration`
#[derive(Debug, Deserialize)]
pub struct OpenIdConfiguration {
    pub token_endpoint: Option<String>,
}

/// Response of the client-credentials grant at the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
}

impl TokenResponse {
    /// Value for the `Authorization` header, e.g. `Bearer eyJ...`
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserializes_keycloak_shape() {
        // Keycloak returns more fields than the job consumes
        let json = r#"{
            "access_token": "eyJhbGciOiJSUzI1NiJ9.payload.sig",
            "expires_in": 300,
            "refresh_expires_in": 0,
            "token_type": "Bearer",
            "not-before-policy": 0,
            "scope": "profile email"
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 300);
        assert_eq!(
            token.authorization_header(),
            "Bearer eyJhbGciOiJSUzI1NiJ9.payload.sig"
        );
    }

    #[test]
    fn test_discovery_document_tolerates_missing_token_endpoint() {
        let config: OpenIdConfiguration = serde_json::from_str(r#"{"issuer": "x"}"#).unwrap();
        assert!(config.token_endpoint.is_none());
    }
}
