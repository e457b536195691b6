//! # Backend Providers
//!
//! Clients for the two external systems the job reconciles between, plus
//! the trait seams the reconciler consumes them through. The traits keep
//! the orchestration testable against in-memory fakes.

pub mod keycloak;
pub mod vault;

use async_trait::async_trait;

use crate::record::{InitialAccessCreated, InitialAccessSummary, PersistedRecord};

pub use keycloak::{IssuerError, KeycloakClient};
pub use vault::{StoreError, VaultClient};

/// Outcome of an idempotent write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store was updated
    Written,
    /// The store already held identical data; no write call was made
    Unchanged,
}

/// Issuing authority for client initial access tokens
#[async_trait]
pub trait AccessTokenIssuer: Send + Sync {
    /// List all currently registered tokens (summaries, no secret values)
    async fn list_initial_access(&self) -> Result<Vec<InitialAccessSummary>, IssuerError>;

    /// Mint a new token with the given use count and validity (seconds)
    async fn create_initial_access(
        &self,
        count: u32,
        expiration_secs: i64,
    ) -> Result<InitialAccessCreated, IssuerError>;

    /// Realm endpoint the tokens are valid against
    fn realm_url(&self) -> &str;
}

/// Store holding the persisted copy of the token
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the persisted record at `path`
    ///
    /// Absence is the expected branch and surfaces as
    /// [`StoreError::NotFound`]; every other error is a real failure.
    async fn read_record(&self, path: &str) -> Result<PersistedRecord, StoreError>;

    /// Upsert the record at `path`, skipping the write when the stored
    /// data is already identical
    async fn write_record(
        &self,
        path: &str,
        record: &PersistedRecord,
    ) -> Result<WriteOutcome, StoreError>;
}
