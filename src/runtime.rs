//! # Runtime
//!
//! Wires configuration and the two backend clients into a single
//! reconciliation run.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::provider::{KeycloakClient, VaultClient};
use crate::reconciler;

/// Install the tracing subscriber
///
/// Must run before any client construction so setup failures are logged.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keycloak_iat_sync=info".into()),
        )
        .init();
}

/// Execute one sync run to completion
pub async fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "starting initial access token sync for realm {} -> {}",
        config.keycloak_realm, config.vault_secret_path
    );

    // Both constructions authenticate; failures here are fatal setup
    // errors and are not retried
    let keycloak = KeycloakClient::new(&config)
        .await
        .context("keycloak client setup failed")?;
    let vault = VaultClient::new(&config)
        .await
        .context("vault client setup failed")?;

    reconciler::run_sync(&config, &keycloak, &vault).await?;
    Ok(())
}
