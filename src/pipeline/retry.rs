use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use rand::Rng;

use super::transport::{TransportErrorKind, TransportFailure};
use crate::config::RetryConfig;

/// Transport error codes and messages that mean "the connection, not the request, failed".
const TRANSIENT_TRANSPORT_MARKERS: [&str; 12] = [
    "ECONNABORTED",
    "ECONNRESET",
    "ECONNREFUSED",
    "ETIMEDOUT",
    "ENOTFOUND",
    "ENETUNREACH",
    "EAI_AGAIN",
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "timed out",
];

/// Only these methods are replayed after a transient failure.
pub fn is_idempotent(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

pub fn is_retryable_status(status: u16, config: &RetryConfig) -> bool {
    config.retryable_statuses.contains(&status)
}

pub fn is_retryable_transport(failure: &TransportFailure) -> bool {
    if matches!(
        failure.kind,
        TransportErrorKind::Timeout | TransportErrorKind::Connect
    ) {
        return true;
    }
    let detail = failure.detail.to_ascii_lowercase();
    TRANSIENT_TRANSPORT_MARKERS
        .iter()
        .any(|marker| detail.contains(&marker.to_ascii_lowercase()))
}

/// `min(base * 2^attempt + jitter, max)`, with `attempt` counted from 1.
pub fn backoff_delay(attempt: u32, config: &RetryConfig, jitter_ms: u64) -> Duration {
    let exponential = config
        .base_delay_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    let delay = exponential.saturating_add(jitter_ms).min(config.max_delay_ms);
    Duration::from_millis(delay)
}

/// A uniformly random jitter in `0..max_jitter_ms`.
pub fn random_jitter(config: &RetryConfig) -> u64 {
    if config.max_jitter_ms == 0 {
        return 0;
    }
    rand::rng().random_range(0..config.max_jitter_ms)
}

/// Suspends the pipeline between retries.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
