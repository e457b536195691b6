//! # Reconciliation
//!
//! The decision core of the job and the run-to-completion orchestration
//! around it.
//!
//! [`decide`] is a pure function over the persisted record (or its
//! absence), the issuer's live record list, and the evaluation time. All
//! I/O stays in the two provider clients, so the decision table is directly
//! unit-testable.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::config::Config;
use crate::constants::SECONDS_PER_DAY;
use crate::provider::{AccessTokenIssuer, RecordStore, StoreError, WriteOutcome};
use crate::record::{InitialAccessSummary, PersistedRecord};

/// What a reconciliation run decided to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Mint a fresh token and persist it, secret value included
    CreateNew,
    /// Persist the existing record with the remaining-use counter taken
    /// from the issuer's live value
    Refresh(PersistedRecord),
}

/// Result of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub action: ActionKind,
    pub write: WriteOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Created,
    Refreshed,
}

/// Decide whether the persisted token must be replaced or only refreshed
///
/// Replacement wins on the first matching condition: no persisted record,
/// expiry within the grace window, exhausted uses, or no live record with
/// the persisted id (revoked or lost out-of-band). Otherwise the remaining
/// count is taken from the live record; the secret itself is immutable for
/// a given id and is not re-fetched.
pub fn decide(
    persisted: Option<&PersistedRecord>,
    live: &[InitialAccessSummary],
    now: i64,
) -> Action {
    let Some(record) = persisted else {
        return Action::CreateNew;
    };
    if record.is_expired(now) || record.remaining_count == 0 {
        return Action::CreateNew;
    }
    // First match wins if the issuer ever held duplicate ids
    let Some(live_match) = live.iter().find(|cia| cia.id == record.id) else {
        return Action::CreateNew;
    };

    let mut refreshed = record.clone();
    refreshed.remaining_count = live_match.remaining_count;
    Action::Refresh(refreshed)
}

/// Run one reconciliation: read, decide, mint or refresh, write back
pub async fn run_sync(
    config: &Config,
    issuer: &dyn AccessTokenIssuer,
    store: &dyn RecordStore,
) -> Result<SyncOutcome> {
    let path = &config.vault_secret_path;

    info!("reading initial access token from vault: {path}");
    let persisted = match store.read_record(path).await {
        Ok(record) => Some(record),
        // Only absence is a normal branch; forbidden/malformed stay fatal
        Err(StoreError::NotFound(_)) => None,
        Err(err) => return Err(err).context("failed to read persisted record"),
    };

    let live = issuer
        .list_initial_access()
        .await
        .context("failed to list initial access tokens")?;

    let now = Utc::now().timestamp();
    let (action, record) = match decide(persisted.as_ref(), &live, now) {
        Action::CreateNew => {
            info!(
                "creating new initial access token: client count {}, expiration {} days",
                config.max_client_count, config.expiration_days
            );
            let created = issuer
                .create_initial_access(
                    config.max_client_count,
                    i64::from(config.expiration_days) * SECONDS_PER_DAY,
                )
                .await
                .context("failed to create initial access token")?;
            (
                ActionKind::Created,
                PersistedRecord::from_created(created, issuer.realm_url()),
            )
        }
        Action::Refresh(mut record) => {
            info!(
                "updating initial access token ({}) information",
                record.id
            );
            record.url = issuer.realm_url().to_string();
            (ActionKind::Refreshed, record)
        }
    };

    let write = store
        .write_record(path, &record)
        .await
        .context("failed to write record to vault")?;

    match write {
        WriteOutcome::Written => info!("✅ wrote initial access token to vault: {path}"),
        WriteOutcome::Unchanged => info!("initial access token already up to date: {path}"),
    }

    Ok(SyncOutcome { action, write })
}
