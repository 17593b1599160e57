//! Recent-review tracking for webhook deduplication.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

/// How long a pull request stays ineligible after a completed review.
pub fn default_cooldown() -> Duration {
    Duration::minutes(5)
}

/// Record of the most recent review for one pull request.
#[derive(Debug, Clone, Copy)]
pub struct DedupEntry {
    /// When the review completed.
    pub last_reviewed: DateTime<Utc>,
    /// Id of the posted comment.
    pub comment_id: u64,
}

/// In-memory map of recently reviewed pull requests.
///
/// Entries are created after each completed review and never evicted; memory
/// growth over a long-running process is an accepted simplification. State is
/// per-process: a second instance or a restart does not share it, so a
/// redelivery within the window from elsewhere will duplicate a review.
///
/// Two near-simultaneous deliveries for the same PR can both pass
/// [`recently_reviewed`](Self::recently_reviewed) before either records —
/// the check is deliberately not serialized with the review, because that
/// would mean holding a lock across network calls.
pub struct ReviewTracker {
    entries: RwLock<HashMap<String, DedupEntry>>,
    cooldown: Duration,
}

impl ReviewTracker {
    /// Tracker with the standard 5-minute cool-down.
    pub fn new() -> Self {
        Self::with_cooldown(default_cooldown())
    }

    /// Tracker with a custom cool-down window.
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            cooldown,
        }
    }

    /// Canonical dedup key for a pull request.
    ///
    /// # Examples
    ///
    /// ```
    /// use heimdall_server::ReviewTracker;
    ///
    /// assert_eq!(ReviewTracker::key("acme", "widgets", 42), "acme/widgets#42");
    /// ```
    pub fn key(owner: &str, repo: &str, pr_number: u64) -> String {
        format!("{owner}/{repo}#{pr_number}")
    }

    /// Whether the PR was reviewed within the cool-down window of `now`.
    pub fn recently_reviewed_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).copied())
            .is_some_and(|entry| now - entry.last_reviewed < self.cooldown)
    }

    /// [`recently_reviewed_at`](Self::recently_reviewed_at) against the wall clock.
    pub fn recently_reviewed(&self, key: &str) -> bool {
        self.recently_reviewed_at(key, Utc::now())
    }

    /// Record a completed review at an explicit timestamp.
    pub fn record_at(&self, key: &str, comment_id: u64, now: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                DedupEntry {
                    last_reviewed: now,
                    comment_id,
                },
            );
        }
    }

    /// Record a completed review now.
    pub fn record(&self, key: &str, comment_id: u64) {
        self.record_at(key, comment_id, Utc::now());
    }

    /// Look up the entry for a pull request.
    pub fn entry(&self, key: &str) -> Option<DedupEntry> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).copied())
    }
}

impl Default for ReviewTracker {
    fn default() -> Self {
        Self::new()
    }
}
