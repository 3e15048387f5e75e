//! Transport-level retry with exponential backoff
//!
//! Only idempotent requests are retried. A request is retried when the server
//! answers with a transient status, when the connection cannot be established,
//! or when the attempt times out. Both kinds share one retry budget. Other
//! transport errors are returned to the caller unchanged.
use std::time::Duration;

use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    Client as HttpClient, Method, Request, Response, StatusCode,
};

/// HTTP statuses worth another attempt
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base delay; retry `n` waits `backoff_factor * 2^(n-1)`, except the first
    /// retry which goes out immediately
    pub backoff_factor: Duration,
    /// Upper bound for a single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }

        let multiplier = 2u32.saturating_pow(retry - 1);
        self.backoff_factor
            .saturating_mul(multiplier)
            .min(self.max_backoff)
    }

    /// Whether a response with `status` to a `method` request may be retried
    pub fn is_retryable(&self, method: &Method, status: StatusCode) -> bool {
        is_idempotent(method) && RETRY_STATUSES.contains(&status.as_u16())
    }

    /// Whether a transport error on a `method` request may be retried
    pub fn is_retryable_error(&self, method: &Method, error: &reqwest::Error) -> bool {
        is_idempotent(method) && (error.is_timeout() || error.is_connect())
    }

    /// Delay requested by a `Retry-After` header on 429/503, capped at `max_backoff`
    ///
    /// Only the delay-seconds form is understood.
    pub fn retry_after(&self, status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
        if !matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            return None;
        }

        let seconds = headers
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;
        Some(Duration::from_secs(seconds).min(self.max_backoff))
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Executes `request`, retrying transient failures per `policy`
///
/// When retries run out the last response or error is returned as-is, so
/// callers still see the failing status.
pub async fn send_with_retry(
    client: &HttpClient,
    policy: &RetryPolicy,
    request: Request,
) -> reqwest::Result<Response> {
    let mut retry = 0;

    loop {
        let Some(attempt) = request.try_clone() else {
            // Streaming bodies cannot be replayed
            return client.execute(request).await;
        };

        let delay = match client.execute(attempt).await {
            Ok(response) => {
                let status = response.status();
                if retry >= policy.max_retries || !policy.is_retryable(request.method(), status) {
                    return Ok(response);
                }

                retry += 1;
                let delay = policy
                    .retry_after(status, response.headers())
                    .unwrap_or_else(|| policy.backoff(retry));

                tracing::warn!(
                    status = %status,
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Transient HTTP status, retrying"
                );
                delay
            }
            Err(e) => {
                if retry >= policy.max_retries || !policy.is_retryable_error(request.method(), &e) {
                    return Err(e);
                }

                retry += 1;
                let delay = policy.backoff(retry);

                tracing::warn!(
                    error = %e.without_url(),
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Transport error, retrying"
                );
                delay
            }
        };

        tokio::time::sleep(delay).await;
    }
}
