//! Per-repository policy resolution with in-memory caching.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use heimdall_github::SourceControl;

use crate::policy::{PolicyDocument, ReviewPolicy};

/// Repository-relative location of the policy document.
pub const POLICY_PATH: &str = ".heimdall.yml";

type PolicyKey = (String, String, String);

/// Fetches, merges, and caches per-repository review policies.
///
/// Policies are cached per `(owner, repo, ref)` triple for the lifetime of
/// the process — there is no TTL or invalidation beyond
/// [`clear_cache`](Self::clear_cache). Fetch and parse failures degrade to
/// the default policy and are cached the same way, so a broken document does
/// not cause the remote to be re-queried on every review.
pub struct PolicyResolver {
    scm: Arc<dyn SourceControl>,
    cache: RwLock<HashMap<PolicyKey, Arc<ReviewPolicy>>>,
}

impl PolicyResolver {
    /// Create a resolver backed by a source-control client.
    pub fn new(scm: Arc<dyn SourceControl>) -> Self {
        Self {
            scm,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the review policy for a repository at a ref.
    ///
    /// Never fails: a missing document yields the defaults (logged at info),
    /// and a fetch or parse error yields the defaults (logged at warning).
    pub async fn resolve(&self, owner: &str, repo: &str, git_ref: &str) -> Arc<ReviewPolicy> {
        let key = (owner.to_string(), repo.to_string(), git_ref.to_string());

        if let Some(policy) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&key).cloned())
        {
            return policy;
        }

        let policy = match self
            .scm
            .get_file_content(owner, repo, POLICY_PATH, git_ref)
            .await
        {
            Ok(Some(content)) => match PolicyDocument::from_yaml(&content) {
                Ok(doc) => ReviewPolicy::default().merged_with(&doc),
                Err(e) => {
                    warn!(owner, repo, git_ref, error = %e, "invalid policy document, using defaults");
                    ReviewPolicy::default()
                }
            },
            Ok(None) => {
                info!(owner, repo, git_ref, "no policy document, using defaults");
                ReviewPolicy::default()
            }
            Err(e) => {
                warn!(owner, repo, git_ref, error = %e, "policy fetch failed, using defaults");
                ReviewPolicy::default()
            }
        };

        let policy = Arc::new(policy);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, policy.clone());
        }
        policy
    }

    /// Drop every cached policy.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Number of cached `(owner, repo, ref)` entries.
    pub fn cached_entries(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }
}
