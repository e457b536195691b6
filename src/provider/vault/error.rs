//! Error types for the Vault KV client.
//!
//! `NotFound` is an expected outcome the reconciler branches on; the other
//! variants are real failures. Only transport errors and 5xx responses are
//! retryable.

use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No secret exists at the path (the expected-absent branch)
    #[error("secret not found at '{0}'")]
    NotFound(String),

    /// The token is not allowed to touch the path
    #[error("permission denied accessing secret '{0}'")]
    Forbidden(String),

    /// The secret exists but its payload does not have the expected shape
    #[error("malformed secret at '{path}': {reason}")]
    MalformedSecret { path: String, reason: String },

    /// Approle login failed
    #[error("vault approle login failed: {reason}")]
    Auth { reason: String },

    /// Vault answered with a non-success status
    #[error("vault returned status {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// Transport-level failure (connect, timeout, TLS, body decode)
    #[error("vault request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(_) => true,
            StoreError::Api { status, .. } => status.is_server_error(),
            StoreError::NotFound(_)
            | StoreError::Forbidden(_)
            | StoreError::MalformedSecret { .. }
            | StoreError::Auth { .. } => false,
        }
    }
}
