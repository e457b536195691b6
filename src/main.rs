use std::process::ExitCode;

use tracing::error;

use keycloak_iat_sync::runtime;

#[tokio::main]
async fn main() -> ExitCode {
    // Pick up a local .env when present; real deployments set the
    // environment directly
    dotenvy::dotenv().ok();

    runtime::init_tracing();

    match runtime::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("initial access token sync failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
