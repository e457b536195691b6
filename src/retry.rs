//! # Retry with Fibonacci Backoff
//!
//! A uniform retry wrapper for backend calls. Errors classify themselves as
//! transient (network failures, 5xx responses) or permanent (not-found,
//! forbidden, malformed payloads); only transient errors are retried, up to
//! a bounded attempt count with Fibonacci backoff between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::constants::{RETRY_MAX_ATTEMPTS, RETRY_MAX_BACKOFF_SECS, RETRY_MIN_BACKOFF_SECS};

/// Errors that know whether a retry could help
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Fibonacci sequence of delays between a lower and upper bound
///
/// With bounds (1, 8) the sequence is 1s, 1s, 2s, 3s, 5s, 8s, 8s, ...
#[derive(Debug)]
pub struct FibonacciBackoff {
    previous: u64,
    current: u64,
    max_secs: u64,
}

impl FibonacciBackoff {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            previous: 0,
            current: min_secs,
            max_secs,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max_secs);
        let next = self.previous + self.current;
        self.previous = self.current;
        self.current = next;
        Duration::from_secs(delay)
    }
}

/// Run `call` until it succeeds, a permanent error surfaces, or the attempt
/// cap is reached
///
/// Permanent errors are returned after the first attempt; the caller keeps
/// its typed branches (e.g. not-found) intact.
pub async fn retry_with_backoff<T, E, F, Fut>(operation: &str, mut call: F) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = FibonacciBackoff::new(RETRY_MIN_BACKOFF_SECS, RETRY_MAX_BACKOFF_SECS);
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < RETRY_MAX_ATTEMPTS => {
                let delay = backoff.next_delay();
                warn!(
                    "{operation} failed (attempt {attempt}/{RETRY_MAX_ATTEMPTS}): {err}; retrying in {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
