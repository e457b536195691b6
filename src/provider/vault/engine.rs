//! KV storage engine versions and their URL layouts.
//!
//! Vault's two KV generations expose incompatible paths and payload shapes.
//! The version is inferred once per mount by probing the engine
//! configuration endpoint and branched on through this enum instead of at
//! every call site.

/// KV secret engine generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvEngine {
    /// Legacy flat key/value engine
    V1,
    /// Versioned engine (`data`/`metadata` envelope)
    V2,
}

impl KvEngine {
    /// URL for reading or upserting the secret data at `path`
    pub fn data_url(self, base_url: &str, path: &str) -> String {
        match self {
            KvEngine::V1 => format!("{base_url}/v1/{path}"),
            KvEngine::V2 => {
                let (mount, rest) = split_mount(path);
                format!("{base_url}/v1/{mount}/data/{rest}")
            }
        }
    }
}

/// Split a slash-delimited secret path into its mount point and the
/// remainder
pub fn split_mount(path: &str) -> (&str, &str) {
    path.split_once('/').unwrap_or((path, ""))
}

/// Engine configuration endpoint used to probe for KV v2
pub fn mount_config_url(base_url: &str, mount: &str) -> String {
    format!("{base_url}/v1/{mount}/config")
}
