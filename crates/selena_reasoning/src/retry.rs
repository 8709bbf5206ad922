//! Exponential backoff around provider HTTP calls.
//!
//! Transient statuses (408, 429, 5xx gateway family) and network errors are
//! retried; any other non-success status fails on the spot.

use anyhow::Result;
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Upper bound of the random-ish jitter added to each wait.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before attempt `attempt + 1`, jitter excluded. `attempt` is 1-based.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Run `operation` until it yields a success status, a non-retryable
    /// status, or the attempts run out.
    pub async fn send<F, Fut>(&self, provider: &str, operation: F) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = reqwest::Result<Response>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=attempts {
            match operation().await {
                Ok(response) if response.status().is_success() => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", provider, attempt);
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    if !is_retryable_status(status) {
                        anyhow::bail!("{} API error ({}): {}", provider, status, body);
                    }
                    tracing::warn!(
                        "{} returned {} on attempt {}/{}: {}",
                        provider,
                        status,
                        attempt,
                        attempts,
                        body.chars().take(200).collect::<String>()
                    );
                    last_error = format!("{} ({}): {}", provider, status, body);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} network error on attempt {}/{}: {}",
                        provider,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = format!("{}: {}", provider, e);
                }
            }

            if attempt < attempts {
                let wait = self.delay_after(attempt) + self.jitter();
                tracing::debug!("{} retrying in {:.1}s", provider, wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }

        anyhow::bail!("{} failed after {} attempts: {}", provider, attempts, last_error)
    }

    fn jitter(&self) -> Duration {
        let bound = self.max_jitter.as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64;
        Duration::from_millis(nanos % bound)
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
