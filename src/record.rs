//! # Initial Access Token Records
//!
//! Data model for the credential in both of its representations:
//!
//! - the Keycloak wire shapes returned by the admin API (camelCase
//!   `remainingCount`, secret value present only on creation)
//! - the persisted shape written to Vault (snake_case keys, augmented with
//!   the realm URL so consumers know where the token is valid)

use serde::{Deserialize, Serialize};

use crate::constants::GRACE_PERIOD_SECS;

/// List-response item from `GET /admin/realms/{realm}/clients-initial-access`
///
/// Summaries never carry the secret value. Keycloak omits `remainingCount`
/// once a token is fully consumed, so it deserializes to 0.
#[derive(Debug, Clone, Deserialize)]
pub struct InitialAccessSummary {
    pub id: String,
    /// Issuance time (seconds since epoch)
    pub timestamp: i64,
    /// Validity duration from `timestamp` (seconds)
    pub expiration: i64,
    pub count: u32,
    #[serde(rename = "remainingCount", default)]
    pub remaining_count: u32,
}

/// Create-response from `POST /admin/realms/{realm}/clients-initial-access`
///
/// The only place the bearer value (`token`) is ever observable.
#[derive(Debug, Clone, Deserialize)]
pub struct InitialAccessCreated {
    pub id: String,
    pub token: String,
    pub timestamp: i64,
    pub expiration: i64,
    pub count: u32,
    #[serde(rename = "remainingCount", default)]
    pub remaining_count: u32,
}

/// Request body for minting a new initial access token
#[derive(Debug, Clone, Serialize)]
pub struct InitialAccessRequest {
    pub count: u32,
    /// Validity duration (seconds)
    pub expiration: i64,
}

/// The Vault copy of an initial access token
///
/// Field names double as the KV secret keys. `id` ties the copy back to a
/// live Keycloak record; when no live record matches, the copy is orphaned
/// and treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: String,
    pub token: String,
    pub timestamp: i64,
    pub expiration: i64,
    pub count: u32,
    pub remaining_count: u32,
    /// Realm endpoint the token is valid against
    pub url: String,
}

impl PersistedRecord {
    pub fn from_created(created: InitialAccessCreated, realm_url: &str) -> Self {
        Self {
            id: created.id,
            token: created.token,
            timestamp: created.timestamp,
            expiration: created.expiration,
            count: created.count,
            remaining_count: created.remaining_count,
            url: realm_url.to_string(),
        }
    }

    pub fn expires_at(&self) -> i64 {
        self.timestamp + self.expiration
    }

    /// Whether the token expires within the grace window as of `now`.
    /// Usable means `now < timestamp + expiration - grace`.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at() - GRACE_PERIOD_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: i64, expiration: i64, remaining_count: u32) -> PersistedRecord {
        PersistedRecord {
            id: "11111111-2222-3333-4444-555555555555".to_string(),
            token: "eyJhbGciOi.example.token".to_string(),
            timestamp,
            expiration,
            count: 100,
            remaining_count,
            url: "https://sso.example.com/realms/apps".to_string(),
        }
    }

    #[test]
    fn test_not_expired_well_before_grace_window() {
        // Expires 10 days from now
        let now = 1_700_000_000;
        let rec = record(now, 10 * 86_400, 50);
        assert!(!rec.is_expired(now));
    }

    #[test]
    fn test_expired_within_grace_window() {
        // Expires in 12 hours: inside the 1-day grace window
        let now = 1_700_000_000;
        let rec = record(now - 86_400, 86_400 + 12 * 3_600, 50);
        assert!(rec.is_expired(now));
    }

    #[test]
    fn test_expired_at_exact_grace_boundary() {
        // Expires exactly one grace period from now: no longer usable
        let now = 1_700_000_000;
        let rec = record(now, GRACE_PERIOD_SECS, 50);
        assert!(rec.is_expired(now));
    }

    #[test]
    fn test_expired_long_ago() {
        let now = 1_700_000_000;
        let rec = record(now - 100 * 86_400, 30 * 86_400, 50);
        assert!(rec.is_expired(now));
    }

    #[test]
    fn test_summary_deserializes_remaining_count_alias() {
        let json = r#"{
            "id": "abc",
            "timestamp": 1700000000,
            "expiration": 2592000,
            "count": 100,
            "remainingCount": 42
        }"#;
        let summary: InitialAccessSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.remaining_count, 42);
    }

    #[test]
    fn test_summary_missing_remaining_count_defaults_to_zero() {
        // Keycloak drops the field once the token is fully consumed
        let json = r#"{
            "id": "abc",
            "timestamp": 1700000000,
            "expiration": 2592000,
            "count": 100
        }"#;
        let summary: InitialAccessSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.remaining_count, 0);
    }

    #[test]
    fn test_created_response_round_trips_into_persisted() {
        let json = r#"{
            "id": "new-id",
            "token": "bearer-value",
            "timestamp": 1700000000,
            "expiration": 2592000,
            "count": 100,
            "remainingCount": 100
        }"#;
        let created: InitialAccessCreated = serde_json::from_str(json).unwrap();
        let persisted =
            PersistedRecord::from_created(created, "https://sso.example.com/realms/apps");

        assert_eq!(persisted.id, "new-id");
        assert_eq!(persisted.token, "bearer-value");
        assert_eq!(persisted.remaining_count, 100);
        assert_eq!(persisted.url, "https://sso.example.com/realms/apps");

        // Persisted keys are snake_case, ready for the KV payload
        let value = serde_json::to_value(&persisted).unwrap();
        assert!(value.get("remaining_count").is_some());
        assert!(value.get("remainingCount").is_none());
    }
}
