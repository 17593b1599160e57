use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;

/// In-process metrics handle.
///
/// Cheap to clone; all clones share the same counters. Constructed once at
/// startup and passed explicitly into each component that records events —
/// there is no global registry.
///
/// # Examples
///
/// ```
/// use heimdall_core::Metrics;
///
/// let metrics = Metrics::new();
/// metrics.incr_webhooks_received();
/// metrics.incr_model_calls();
/// metrics.incr_model_failures();
/// metrics.record_error("provider timed out");
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.webhooks_received, 1);
/// assert_eq!(snapshot.model_failures, 1);
/// assert_eq!(snapshot.last_error.as_deref(), Some("provider timed out"));
/// ```
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    started_at: Instant,
    webhooks_received: AtomicU64,
    webhooks_processed: AtomicU64,
    model_calls: AtomicU64,
    model_successes: AtomicU64,
    model_failures: AtomicU64,
    comments_posted: AtomicU64,
    last_error: RwLock<Option<String>>,
}

impl Metrics {
    /// Create a fresh metrics handle with all counters at zero.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                started_at: Instant::now(),
                webhooks_received: AtomicU64::new(0),
                webhooks_processed: AtomicU64::new(0),
                model_calls: AtomicU64::new(0),
                model_successes: AtomicU64::new(0),
                model_failures: AtomicU64::new(0),
                comments_posted: AtomicU64::new(0),
                last_error: RwLock::new(None),
            }),
        }
    }

    /// A webhook delivery arrived (any event type, post-signature-check).
    pub fn incr_webhooks_received(&self) {
        self.inner.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    /// A webhook delivery resulted in a completed review.
    pub fn incr_webhooks_processed(&self) {
        self.inner.webhooks_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// A model invocation attempt was made (primary or fallback).
    pub fn incr_model_calls(&self) {
        self.inner.model_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// A model invocation attempt returned content.
    pub fn incr_model_successes(&self) {
        self.inner.model_successes.fetch_add(1, Ordering::Relaxed);
    }

    /// A model invocation attempt failed.
    pub fn incr_model_failures(&self) {
        self.inner.model_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A review comment was posted.
    pub fn incr_comments_posted(&self) {
        self.inner.comments_posted.fetch_add(1, Ordering::Relaxed);
    }

    /// Remember the most recent error message for the health endpoint.
    pub fn record_error(&self, message: &str) {
        if let Ok(mut slot) = self.inner.last_error.write() {
            *slot = Some(message.to_string());
        }
    }

    /// Produce a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.inner.started_at.elapsed().as_secs(),
            webhooks_received: self.inner.webhooks_received.load(Ordering::Relaxed),
            webhooks_processed: self.inner.webhooks_processed.load(Ordering::Relaxed),
            model_calls: self.inner.model_calls.load(Ordering::Relaxed),
            model_successes: self.inner.model_successes.load(Ordering::Relaxed),
            model_failures: self.inner.model_failures.load(Ordering::Relaxed),
            comments_posted: self.inner.comments_posted.load(Ordering::Relaxed),
            last_error: self
                .inner
                .last_error
                .read()
                .ok()
                .and_then(|slot| slot.clone()),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable point-in-time view of the [`Metrics`] counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Seconds since the metrics handle was created.
    pub uptime_secs: u64,
    /// Webhook deliveries accepted past signature verification.
    pub webhooks_received: u64,
    /// Deliveries that produced a completed review.
    pub webhooks_processed: u64,
    /// Model invocation attempts.
    pub model_calls: u64,
    /// Successful model invocations.
    pub model_successes: u64,
    /// Failed model invocations.
    pub model_failures: u64,
    /// Review comments posted.
    pub comments_posted: u64,
    /// Most recent error message, if any.
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_clones() {
        let metrics = Metrics::new();
        let clone = metrics.clone();

        metrics.incr_model_calls();
        clone.incr_model_calls();
        clone.incr_model_successes();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.model_calls, 2);
        assert_eq!(snapshot.model_successes, 1);
        assert_eq!(snapshot.model_failures, 0);
    }

    #[test]
    fn last_error_keeps_most_recent() {
        let metrics = Metrics::new();
        assert!(metrics.snapshot().last_error.is_none());

        metrics.record_error("first");
        metrics.record_error("second");
        assert_eq!(metrics.snapshot().last_error.as_deref(), Some("second"));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let metrics = Metrics::new();
        metrics.incr_comments_posted();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["commentsPosted"], 1);
        assert!(json.get("comments_posted").is_none());
    }
}
