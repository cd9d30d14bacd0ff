//! HTTP fetching with exponential backoff retry logic.
//!
//! [`Fetcher`] is the single lowest-level I/O primitive of the pipeline: both
//! page markup and image bytes are retrieved through it. Every request uses
//! the fixed identifying `User-Agent` and a per-request timeout (20 s for
//! pages, 15 s for images).
//!
//! # Retry Strategy
//!
//! - 3 attempts total per URL
//! - Exponential backoff starting at 500 ms, doubling per attempt
//! - Maximum delay capped at 8 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Exhausted retries surface as [`ScrapeError::Connect`] for that URL; the
//! caller decides whether that is fatal (page fetch) or recoverable (image
//! fetch).

use crate::error::{Result, ScrapeError};
use rand::{Rng, rng};
use std::fmt::Display;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{instrument, warn};

/// Identifying client header sent with every request.
pub const USER_AGENT: &str = "scrape-llm/1.1 (+https://example.local)";

/// Per-request timeout for page fetches.
const PAGE_TIMEOUT: Duration = Duration::from_secs(20);
/// Per-request timeout for image fetches.
const IMAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Retry policy with exponential backoff and jitter.
///
/// The delay between attempts follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Number of retries after the first attempt.
    max_retries: usize,
    /// Initial delay between attempts (doubles with each retry).
    base_delay: Duration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: Duration,
}

impl Backoff {
    pub fn new(max_retries: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// The fetch policy: 3 attempts total, 500 ms initial delay, 8 s cap.
    pub fn fetch_policy() -> Self {
        Self::new(2, Duration::from_millis(500), Duration::from_secs(8))
    }

    /// Run `op` until it succeeds or retries are exhausted, sleeping with
    /// exponential backoff between attempts. Returns the last error when
    /// every attempt fails.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> std::result::Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u128,
                            error = %e,
                            "retries exhausted"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// HTTP client for page and image retrieval.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    policy: Backoff,
}

impl Fetcher {
    /// Build a fetcher with the identifying `User-Agent` and the standard
    /// retry policy.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            policy: Backoff::fetch_policy(),
        })
    }

    /// Fetch a page body as text. Non-2xx statuses count as failures and are
    /// retried like transport errors.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.policy
            .run(|| async move {
                let resp = self
                    .client
                    .get(url)
                    .timeout(PAGE_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?;
                resp.text().await
            })
            .await
            .map_err(|source| ScrapeError::Connect {
                url: url.to_string(),
                source,
            })
    }

    /// Fetch raw bytes (image payloads) with the shorter image timeout.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.policy
            .run(|| async move {
                let resp = self
                    .client
                    .get(url)
                    .timeout(IMAGE_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(resp.bytes().await?.to_vec())
            })
            .await
            .map_err(|source| ScrapeError::Connect {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_policy() -> Backoff {
        // Same attempt budget as the fetch policy, millisecond delays.
        Backoff::new(2, Duration::from_millis(1), Duration::from_millis(4))
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt_without_further_retries() {
        let calls = AtomicUsize::new(0);
        let result: std::result::Result<u32, String> = quick_policy()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(format!("transient failure {n}"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_three_attempts() {
        let calls = AtomicUsize::new(0);
        let result: std::result::Result<u32, String> = quick_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("down".to_string()) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_attempt_success_never_retries() {
        let calls = AtomicUsize::new(0);
        let result: std::result::Result<&str, String> = quick_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok("ok") }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
