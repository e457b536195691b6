//! Keycloak Initial Access Token Sync
//!
//! A run-to-completion job that keeps a Keycloak client initial access
//! token (IAT) synchronized into a HashiCorp Vault secret:
//!
//! 1. **Reads the persisted token** from Vault (KV v1 or v2, auto-detected)
//! 2. **Lists the live tokens** registered in the Keycloak realm
//! 3. **Decides** whether the persisted token is still usable
//! 4. **Mints a replacement** when it is missing, expired, exhausted, or
//!    revoked out-of-band, otherwise refreshes the remaining-use counter
//! 5. **Writes the result back**, skipping the write when nothing changed
//!
//! The job is idempotent and holds no state between runs; it is meant to be
//! invoked periodically by an external scheduler (cron, systemd timer,
//! Kubernetes CronJob). Concurrent invocations against the same secret path
//! are not coordinated here and must be serialized by the caller.

pub mod config;
pub mod constants;
pub mod provider;
pub mod reconciler;
pub mod record;
pub mod retry;
pub mod runtime;

pub use config::Config;
pub use record::{InitialAccessCreated, InitialAccessSummary, PersistedRecord};
