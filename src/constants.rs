//! Default values and fixed parameters for the sync job.

/// Uses granted to a newly minted initial access token
pub const DEFAULT_MAX_CLIENT_COUNT: u32 = 100;

/// Validity window of a newly minted initial access token (days)
pub const DEFAULT_EXPIRATION_DAYS: u32 = 30;

/// Per-call HTTP timeout for both backends (seconds)
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Minimum remaining validity for a token to still count as usable.
/// A token expiring within this window is replaced rather than shipped.
pub const GRACE_PERIOD_SECS: i64 = 86_400;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Attempt cap for transient backend failures within a single run
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Fibonacci backoff bounds between retry attempts (seconds)
pub const RETRY_MIN_BACKOFF_SECS: u64 = 1;
pub const RETRY_MAX_BACKOFF_SECS: u64 = 8;
