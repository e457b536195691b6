//! # Keycloak Admin API Client
//!
//! Client for the clients-initial-access surface of the Keycloak admin
//! REST API.
//!
//! Construction resolves the realm's OpenID discovery document and performs
//! a client-credentials grant; both are fatal on failure and never retried.
//! The resulting bearer token is attached to every admin call and is fetched
//! exactly once per run (runs are short-lived, a 401 is not auto-refreshed).

mod error;
mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::HTTP_TIMEOUT_SECS;
use crate::provider::AccessTokenIssuer;
use crate::record::{InitialAccessCreated, InitialAccessRequest, InitialAccessSummary};
use crate::retry::retry_with_backoff;

pub use error::IssuerError;
use types::{OpenIdConfiguration, TokenResponse};

pub struct KeycloakClient {
    http: ReqwestClient,
    realm_url: String,
    admin_realm_url: String,
    token: TokenResponse,
}

impl std::fmt::Debug for KeycloakClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakClient")
            .field("realm_url", &self.realm_url)
            .finish_non_exhaustive()
    }
}

impl KeycloakClient {
    /// Connect to the realm's admin API
    ///
    /// # Errors
    ///
    /// Returns an error if the discovery document cannot be fetched, names
    /// no token endpoint, or the client-credentials exchange is rejected.
    pub async fn new(config: &Config) -> Result<Self, IssuerError> {
        let base_url = config.keycloak_url.trim_end_matches('/').to_string();
        let realm_url = format!("{base_url}/realms/{}", config.keycloak_realm);
        let admin_realm_url = format!("{base_url}/admin/realms/{}", config.keycloak_realm);

        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let token_endpoint = discover_token_endpoint(&http, &realm_url).await?;
        debug!("discovered token endpoint: {token_endpoint}");

        let token = exchange_client_credentials(
            &http,
            &token_endpoint,
            &config.keycloak_client_id,
            &config.keycloak_client_secret,
        )
        .await?;
        info!(
            "authenticated to keycloak realm {} (token valid for {}s)",
            config.keycloak_realm, token.expires_in
        );

        Ok(Self {
            http,
            realm_url,
            admin_realm_url,
            token,
        })
    }

    fn initial_access_url(&self) -> String {
        format!("{}/clients-initial-access", self.admin_realm_url)
    }

    async fn list_once(&self) -> Result<Vec<InitialAccessSummary>, IssuerError> {
        let response = self
            .http
            .get(self.initial_access_url())
            .header("Authorization", self.token.authorization_header())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn create_once(
        &self,
        request: &InitialAccessRequest,
    ) -> Result<InitialAccessCreated, IssuerError> {
        let response = self
            .http
            .post(self.initial_access_url())
            .header("Authorization", self.token.authorization_header())
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AccessTokenIssuer for KeycloakClient {
    async fn list_initial_access(&self) -> Result<Vec<InitialAccessSummary>, IssuerError> {
        let records =
            retry_with_backoff("keycloak initial access list", || self.list_once()).await?;
        debug!("keycloak lists {} initial access token(s)", records.len());
        Ok(records)
    }

    async fn create_initial_access(
        &self,
        count: u32,
        expiration_secs: i64,
    ) -> Result<InitialAccessCreated, IssuerError> {
        let request = InitialAccessRequest {
            count,
            expiration: expiration_secs,
        };
        retry_with_backoff("keycloak initial access create", || {
            self.create_once(&request)
        })
        .await
    }

    fn realm_url(&self) -> &str {
        &self.realm_url
    }
}

async fn discover_token_endpoint(
    http: &ReqwestClient,
    realm_url: &str,
) -> Result<String, IssuerError> {
    let discovery_url = format!("{realm_url}/.well-known/openid-configuration");
    let response = http
        .get(&discovery_url)
        .send()
        .await
        .map_err(|err| IssuerError::Discovery {
            realm_url: realm_url.to_string(),
            reason: err.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(IssuerError::Discovery {
            realm_url: realm_url.to_string(),
            reason: format!("discovery document returned status {}", response.status()),
        });
    }

    let configuration: OpenIdConfiguration =
        response.json().await.map_err(|err| IssuerError::Discovery {
            realm_url: realm_url.to_string(),
            reason: err.to_string(),
        })?;

    configuration
        .token_endpoint
        .ok_or_else(|| IssuerError::Discovery {
            realm_url: realm_url.to_string(),
            reason: "discovery document exposes no token_endpoint".to_string(),
        })
}

async fn exchange_client_credentials(
    http: &ReqwestClient,
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenResponse, IssuerError> {
    let response = http
        .post(token_endpoint)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IssuerError::TokenExchange { status, body });
    }

    Ok(response.json().await?)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IssuerError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(IssuerError::Api { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_access_request_wire_shape() {
        let request = InitialAccessRequest {
            count: 100,
            expiration: 30 * 86_400,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["count"], 100);
        assert_eq!(json["expiration"], 2_592_000);
    }

    #[test]
    fn test_realm_urls_strip_trailing_slash() {
        let base = "https://sso.example.com/".trim_end_matches('/');
        assert_eq!(
            format!("{base}/realms/apps"),
            "https://sso.example.com/realms/apps"
        );
        assert_eq!(
            format!("{base}/admin/realms/apps"),
            "https://sso.example.com/admin/realms/apps"
        );
    }
}
