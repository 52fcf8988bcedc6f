//! Resilient page fetcher
//!
//! One logical fetch is allowed a whole budget of attempts. Any push-back
//! from the site (a 429, another error status, a transport failure) burns
//! one attempt, triggers an identity rotation, and tries again from a fresh
//! Tor exit. A success pauses for a randomized interval before returning so
//! the request rate stays modest even when everything works.
//!
//! Retries are idempotent: only GET requests are issued, and nothing is
//! persisted until the walker has a fully parsed record.

use crate::config::{FetchConfig, ProxyConfig};
use crate::tor::{Rotate, TorError};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors from a logical fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The attempt budget ran out. Item-scoped: callers log, skip the
    /// item, and keep walking.
    #[error("Fetch exhausted for {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },

    /// Identity rotation itself failed; without it the retry strategy
    /// cannot recover and the run is over
    #[error("Identity rotation failed: {0}")]
    Rotation(#[from] TorError),
}

/// Why a single attempt did not produce a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// HTTP 429, the canonical "slow down" signal
    RateLimited,
    /// Any other non-2xx status
    HttpStatus(u16),
    /// Timeout, connection failure, or a failed body read
    Transport(String),
}

impl RetryReason {
    /// Statuses a different exit node will not change
    fn is_permanent(&self) -> bool {
        match self {
            RetryReason::HttpStatus(status) => (400..500).contains(status) && *status != 408,
            _ => false,
        }
    }
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryReason::RateLimited => write!(f, "Rate limited (429)"),
            RetryReason::HttpStatus(status) => write!(f, "HTTP {}", status),
            RetryReason::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

/// Outcome of a single attempt
#[derive(Debug)]
enum AttemptOutcome {
    Success(String),
    Retry(RetryReason),
}

/// Builds the HTTP client used for all catalog traffic
///
/// The client carries the browser-like User-Agent, the per-request timeout,
/// and, when configured, routes everything through the SOCKS proxy. With
/// `socks5h` the proxy also resolves DNS, so no lookups leak outside Tor.
///
/// # Arguments
///
/// * `proxy` - Proxy and identification settings
/// * `fetch` - Timeout settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    proxy: &ProxyConfig,
    fetch: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(proxy.user_agent.clone())
        .timeout(Duration::from_secs(fetch.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(socks) = &proxy.socks_url {
        builder = builder.proxy(Proxy::all(socks)?);
    }

    builder.build()
}

/// Fetches pages with bounded retries and identity rotation
///
/// Owns the HTTP client and the rotator; constructed once at startup and
/// passed by reference wherever pages are needed. The only non-fatal
/// failure it can produce is [`FetchError::Exhausted`].
pub struct Fetcher<R> {
    client: Client,
    rotator: R,
    max_attempts: u32,
    pause_secs: (u64, u64),
    rotate_on_any_error: bool,
}

impl<R: Rotate> Fetcher<R> {
    pub fn new(client: Client, rotator: R, config: &FetchConfig) -> Self {
        Self {
            client,
            rotator,
            max_attempts: config.max_attempts,
            pause_secs: (config.pause_secs_min, config.pause_secs_max),
            rotate_on_any_error: config.rotate_on_any_error,
        }
    }

    /// Fetches one address, rotating identity after every failed attempt
    ///
    /// Every non-2xx status and every transport error is retryable by
    /// default. With `rotate-on-any-error` off, client errors other than
    /// 429 and 408 end the fetch immediately instead of burning budget on
    /// an address that will never improve.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        for attempt in 1..=self.max_attempts {
            tracing::debug!("Fetching {} (attempt {}/{})", url, attempt, self.max_attempts);

            match self.attempt(url).await {
                AttemptOutcome::Success(body) => {
                    self.pause_after_success().await;
                    return Ok(body);
                }
                AttemptOutcome::Retry(reason) => {
                    if !self.rotate_on_any_error && reason.is_permanent() {
                        tracing::warn!(
                            "Giving up on {}: {} will not improve with retries",
                            url,
                            reason
                        );
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                        });
                    }

                    tracing::warn!(
                        "{} for {} on attempt {}/{}, rotating identity",
                        reason,
                        url,
                        attempt,
                        self.max_attempts
                    );
                    self.rotator.rotate().await?;
                }
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// One GET, classified
    async fn attempt(&self, url: &str) -> AttemptOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    return AttemptOutcome::Retry(RetryReason::RateLimited);
                }

                if !status.is_success() {
                    return AttemptOutcome::Retry(RetryReason::HttpStatus(status.as_u16()));
                }

                match response.text().await {
                    Ok(body) => AttemptOutcome::Success(body),
                    Err(e) => AttemptOutcome::Retry(RetryReason::Transport(e.to_string())),
                }
            }
            Err(e) => {
                let description = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else {
                    e.to_string()
                };
                AttemptOutcome::Retry(RetryReason::Transport(description))
            }
        }
    }

    /// Randomized throttle between successful requests
    async fn pause_after_success(&self) {
        let (min, max) = self.pause_secs;
        if max == 0 {
            return;
        }
        let secs = fastrand::u64(min..=max);
        tracing::debug!("Pausing {}s before the next request", secs);
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}
