//! # Vault KV Client
//!
//! Client for reading and writing the persisted token record in HashiCorp
//! Vault.
//!
//! Authentication happens once at construction via an approle login and is
//! fatal on failure. The KV engine generation (v1 flat vs v2 versioned) is
//! probed per mount and cached for the lifetime of the client; a failed
//! probe falls back to the legacy engine.
//!
//! Writes are idempotent: the current value is read first and the upsert is
//! skipped when the stored map is already identical. There is no
//! compare-and-swap beyond that; concurrent runs against the same path must
//! be serialized by the scheduler invoking the job.

mod engine;
mod error;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::constants::HTTP_TIMEOUT_SECS;
use crate::provider::{RecordStore, WriteOutcome};
use crate::record::PersistedRecord;
use crate::retry::retry_with_backoff;

pub use engine::KvEngine;
pub use error::StoreError;

pub struct VaultClient {
    http: ReqwestClient,
    base_url: String,
    token: String,
    /// Engine generation per mount point, filled lazily by the probe
    engines: Mutex<HashMap<String, KvEngine>>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
}

impl VaultClient {
    /// Authenticate to Vault via approle
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Auth`] when the login is rejected or returns
    /// no client token.
    pub async fn new(config: &Config) -> Result<Self, StoreError> {
        let base_url = config.vault_url.trim_end_matches('/').to_string();

        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let response = http
            .post(format!("{base_url}/v1/auth/approle/login"))
            .json(&json!({
                "role_id": config.vault_approle_role_id,
                "secret_id": config.vault_approle_secret_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth {
                reason: format!("status {status}: {body}"),
            });
        }

        let login: LoginResponse = response.json().await?;
        let token = login
            .auth
            .and_then(|auth| auth.client_token)
            .ok_or_else(|| StoreError::Auth {
                reason: "login response carries no client token".to_string(),
            })?;

        info!("authenticated to vault at {base_url} via approle");

        Ok(Self {
            http,
            base_url,
            token,
            engines: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve the KV engine generation for the mount of `path`
    ///
    /// A reachable engine configuration endpoint means KV v2; any failure
    /// selects the legacy engine.
    async fn resolve_engine(&self, path: &str) -> KvEngine {
        let (mount, _) = engine::split_mount(path);

        if let Ok(cache) = self.engines.lock() {
            if let Some(&engine) = cache.get(mount) {
                return engine;
            }
        }

        let probe = self
            .http
            .get(engine::mount_config_url(&self.base_url, mount))
            .header("X-Vault-Token", &self.token)
            .send()
            .await;

        let engine = match probe {
            Ok(response) if response.status().is_success() => KvEngine::V2,
            _ => KvEngine::V1,
        };
        debug!("kv mount '{mount}' resolved to engine {engine:?}");

        if let Ok(mut cache) = self.engines.lock() {
            cache.insert(mount.to_string(), engine);
        }
        engine
    }

    /// Single read attempt returning the raw secret map
    async fn read_raw(&self, path: &str) -> Result<Map<String, Value>, StoreError> {
        let engine = self.resolve_engine(path).await;
        let response = self
            .http
            .get(engine.data_url(&self.base_url, path))
            .header("X-Vault-Token", &self.token)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            404 => return Err(StoreError::NotFound(path.to_string())),
            403 => return Err(StoreError::Forbidden(path.to_string())),
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(StoreError::Api { status, body });
            }
            _ => {}
        }

        let body: Value = response.json().await?;
        match engine {
            KvEngine::V2 => {
                let (data, version) = extract_kv2(path, &body)?;
                debug!("read secret '{path}' at version {version}");
                Ok(data)
            }
            KvEngine::V1 => extract_kv1(path, &body),
        }
    }

    /// Single compare-then-write attempt
    async fn write_once(
        &self,
        path: &str,
        data: &Map<String, Value>,
    ) -> Result<WriteOutcome, StoreError> {
        let current = match self.read_raw(path).await {
            Ok(map) => Some(map),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };

        if !needs_write(current.as_ref(), data) {
            debug!("current data is up-to-date, skipping {path}");
            return Ok(WriteOutcome::Unchanged);
        }

        let engine = self.resolve_engine(path).await;
        let body = match engine {
            KvEngine::V2 => json!({ "data": data }),
            KvEngine::V1 => Value::Object(data.clone()),
        };

        let response = self
            .http
            .post(engine.data_url(&self.base_url, path))
            .header("X-Vault-Token", &self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 403 {
            return Err(StoreError::Forbidden(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api { status, body });
        }

        Ok(WriteOutcome::Written)
    }
}

#[async_trait]
impl RecordStore for VaultClient {
    async fn read_record(&self, path: &str) -> Result<PersistedRecord, StoreError> {
        let data = retry_with_backoff("vault read", || self.read_raw(path)).await?;
        serde_json::from_value(Value::Object(data)).map_err(|err| StoreError::MalformedSecret {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    async fn write_record(
        &self,
        path: &str,
        record: &PersistedRecord,
    ) -> Result<WriteOutcome, StoreError> {
        let Value::Object(data) = serde_json::to_value(record).map_err(|err| {
            StoreError::MalformedSecret {
                path: path.to_string(),
                reason: err.to_string(),
            }
        })?
        else {
            return Err(StoreError::MalformedSecret {
                path: path.to_string(),
                reason: "record does not serialize to a map".to_string(),
            });
        };

        retry_with_backoff("vault write", || self.write_once(path, &data)).await
    }
}

/// Whether the stored map differs from the one about to be written
fn needs_write(current: Option<&Map<String, Value>>, next: &Map<String, Value>) -> bool {
    current != Some(next)
}

/// Unwrap the KV v2 read envelope `{data: {data, metadata: {version}}}`
///
/// A missing inner data block means the secret does not exist (deleted
/// versions leave the envelope behind); a missing version number means the
/// engine answered with something that is not a KV v2 secret.
fn extract_kv2(path: &str, body: &Value) -> Result<(Map<String, Value>, u64), StoreError> {
    let outer = body.get("data").filter(|v| !v.is_null());
    let Some(outer) = outer else {
        return Err(StoreError::NotFound(path.to_string()));
    };

    let data = match outer.get("data").filter(|v| !v.is_null()) {
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(StoreError::MalformedSecret {
                path: path.to_string(),
                reason: "secret data is not a map".to_string(),
            })
        }
        None => return Err(StoreError::NotFound(path.to_string())),
    };

    let version = outer
        .get("metadata")
        .and_then(|meta| meta.get("version"))
        .and_then(Value::as_u64)
        .ok_or_else(|| StoreError::MalformedSecret {
            path: path.to_string(),
            reason: "metadata version missing or invalid".to_string(),
        })?;

    Ok((data, version))
}

/// Unwrap the KV v1 read envelope `{data: {...}}`
fn extract_kv1(path: &str, body: &Value) -> Result<Map<String, Value>, StoreError> {
    match body.get("data").filter(|v| !v.is_null()) {
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(StoreError::MalformedSecret {
            path: path.to_string(),
            reason: "secret data is not a map".to_string(),
        }),
        None => Err(StoreError::NotFound(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_kv2_unwraps_envelope() {
        let body = json!({
            "data": {
                "data": { "id": "abc", "token": "secret-value" },
                "metadata": { "version": 4 }
            }
        });
        let (data, version) = extract_kv2("secret/foo", &body).unwrap();
        assert_eq!(version, 4);
        assert_eq!(data.get("id").unwrap(), "abc");
    }

    #[test]
    fn test_extract_kv2_missing_inner_data_is_not_found() {
        let body = json!({ "data": { "metadata": { "version": 2 } } });
        assert!(matches!(
            extract_kv2("secret/foo", &body),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_extract_kv2_missing_version_is_malformed() {
        let body = json!({ "data": { "data": { "id": "abc" }, "metadata": {} } });
        assert!(matches!(
            extract_kv2("secret/foo", &body),
            Err(StoreError::MalformedSecret { .. })
        ));
    }

    #[test]
    fn test_extract_kv1_unwraps_flat_envelope() {
        let body = json!({ "data": { "id": "abc", "remaining_count": 5 } });
        let data = extract_kv1("secret/foo", &body).unwrap();
        assert_eq!(data.get("remaining_count").unwrap(), 5);
    }

    #[test]
    fn test_extract_kv1_missing_data_is_not_found() {
        let body = json!({ "request_id": "xyz" });
        assert!(matches!(
            extract_kv1("secret/foo", &body),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_needs_write_skips_identical_map() {
        let map = json!({ "id": "abc", "remaining_count": 5 })
            .as_object()
            .cloned()
            .unwrap();
        assert!(!needs_write(Some(&map), &map));
    }

    #[test]
    fn test_needs_write_on_absent_or_differing_map() {
        let stored = json!({ "id": "abc", "remaining_count": 5 })
            .as_object()
            .cloned()
            .unwrap();
        let next = json!({ "id": "abc", "remaining_count": 3 })
            .as_object()
            .cloned()
            .unwrap();
        assert!(needs_write(None, &next));
        assert!(needs_write(Some(&stored), &next));
    }
}
