//! Review dispatch: from a classified event to a posted comment.

use std::sync::Arc;

use tracing::{debug, error, info};

use heimdall_core::{HeimdallError, Metrics, PullRequestSnapshot, Result, SnapshotFile};
use heimdall_github::SourceControl;
use heimdall_model::{InvokeOptions, ModelInvocationResult, ModelManager};
use heimdall_policy::{render_prompt, AiPolicy, PolicyResolver};

use crate::dedup::ReviewTracker;
use crate::event::{classify, EventClass, ReviewRequest, TRIGGER_TOKEN};

const COMMENT_HEADER: &str = "## 🤖 AI Code Review";

/// Terminal state of one handled delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The delivery did not trigger a review.
    Skipped {
        /// Why it was skipped.
        reason: String,
    },
    /// A review was generated and posted.
    Completed {
        /// Id of the posted comment.
        comment_id: u64,
    },
    /// Review execution failed; the message is a user-safe markdown body.
    Failed {
        /// Generic failure text plus the error.
        message: String,
    },
}

/// Drives one webhook delivery through classification, dedup, PR-data
/// retrieval, policy resolution, model invocation, and comment posting.
///
/// Within one delivery those steps run strictly sequentially; deliveries for
/// different pull requests run concurrently on their own tasks.
pub struct Dispatcher {
    scm: Arc<dyn SourceControl>,
    models: ModelManager,
    policies: PolicyResolver,
    tracker: ReviewTracker,
    metrics: Metrics,
}

enum ReviewStep {
    Skip(String),
    Posted(u64),
}

impl Dispatcher {
    /// Assemble a dispatcher from its collaborators.
    pub fn new(
        scm: Arc<dyn SourceControl>,
        models: ModelManager,
        policies: PolicyResolver,
        tracker: ReviewTracker,
        metrics: Metrics,
    ) -> Self {
        Self {
            scm,
            models,
            policies,
            tracker,
            metrics,
        }
    }

    /// The dedup tracker, exposed for inspection.
    pub fn tracker(&self) -> &ReviewTracker {
        &self.tracker
    }

    /// Handle one verified delivery.
    ///
    /// Never returns an error: review failures are converted into a
    /// user-safe [`DispatchOutcome::Failed`] so the webhook endpoint can
    /// answer 200 and the sender does not retry-storm.
    pub async fn handle_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> DispatchOutcome {
        let request = match classify(event_type, payload) {
            EventClass::Skip(reason) => {
                debug!(event_type, reason, "skipping delivery");
                return DispatchOutcome::Skipped {
                    reason: reason.to_string(),
                };
            }
            EventClass::Review(request) => request,
        };

        let key = ReviewTracker::key(&request.owner, &request.repo, request.pr_number);
        if self.tracker.recently_reviewed(&key) {
            debug!(pr = %key, "skipping recently processed pull request");
            return DispatchOutcome::Skipped {
                reason: "recently processed".into(),
            };
        }

        info!(pr = %key, event_type, "review triggered");
        match self.run_review(&request).await {
            Ok(ReviewStep::Skip(reason)) => {
                info!(pr = %key, reason, "review skipped");
                DispatchOutcome::Skipped { reason }
            }
            Ok(ReviewStep::Posted(comment_id)) => {
                self.tracker.record(&key, comment_id);
                self.metrics.incr_webhooks_processed();
                info!(pr = %key, comment_id, "review completed");
                DispatchOutcome::Completed { comment_id }
            }
            Err(e) => {
                error!(pr = %key, error = %e, "review failed");
                self.metrics.record_error(&e.to_string());
                DispatchOutcome::Failed {
                    message: failure_message(&e),
                }
            }
        }
    }

    async fn run_review(&self, request: &ReviewRequest) -> Result<ReviewStep> {
        let files = self
            .scm
            .list_changed_files(&request.owner, &request.repo, request.pr_number)
            .await?;
        if files.is_empty() {
            return Ok(ReviewStep::Skip("no files changed".into()));
        }

        let details = self
            .scm
            .get_pull_request(&request.owner, &request.repo, request.pr_number)
            .await?;

        let snapshot = PullRequestSnapshot {
            number: request.pr_number,
            title: details.title.unwrap_or_default(),
            body: details.body.unwrap_or_default(),
            files: files
                .into_iter()
                .map(|f| {
                    let is_binary = f.patch.is_none();
                    SnapshotFile {
                        filename: f.filename,
                        is_binary,
                        patch: f.patch,
                    }
                })
                .collect(),
        };

        let policy = self
            .policies
            .resolve(&request.owner, &request.repo, &details.head_ref)
            .await;

        if !policy.general.enabled {
            return Ok(ReviewStep::Skip("reviews disabled by policy".into()));
        }
        let changed = snapshot.total_changed_lines();
        if changed < policy.general.min_size || changed > policy.general.max_size {
            return Ok(ReviewStep::Skip(format!(
                "change size of {changed} lines is outside policy bounds"
            )));
        }

        let prompt = render_prompt(&snapshot, &policy);
        let options = invoke_options(&policy.ai);
        let result = self.models.invoke(&prompt, &options).await?;

        let comment_body = format_review_comment(&result);
        let comment_id = self
            .scm
            .create_comment(&request.owner, &request.repo, request.pr_number, &comment_body)
            .await?;
        self.metrics.incr_comments_posted();

        Ok(ReviewStep::Posted(comment_id))
    }
}

fn invoke_options(ai: &AiPolicy) -> InvokeOptions {
    InvokeOptions {
        provider: ai.provider.clone(),
        model_id: ai.model_id.clone(),
        max_tokens: ai.max_tokens,
        temperature: ai.temperature,
        enable_fallback: ai.enable_fallback,
        fallback_provider: ai.fallback_provider.clone(),
    }
}

fn format_review_comment(result: &ModelInvocationResult) -> String {
    let model = result.model_id.as_deref().unwrap_or("default model");
    let footer = if result.used_fallback {
        format!(
            "_Generated by Heimdall via {} ({model}), after falling back from the primary provider._",
            result.provider_name
        )
    } else {
        format!("_Generated by Heimdall via {} ({model})._", result.provider_name)
    };
    format!("{COMMENT_HEADER}\n\n{}\n\n---\n{footer}", result.content)
}

fn failure_message(error: &HeimdallError) -> String {
    format!(
        "{COMMENT_HEADER}\n\nThe automated review could not be completed.\n\n\
         > {error}\n\n\
         Retry by commenting `{TRIGGER_TOKEN}` on the pull request."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::{CannedProvider, MockScm};

    fn pr_payload(action: &str) -> serde_json::Value {
        json!({
            "action": action,
            "pull_request": { "number": 42 },
            "repository": { "name": "widgets", "owner": { "login": "acme" } }
        })
    }

    fn two_file_scm() -> MockScm {
        MockScm::new().with_files(vec![
            MockScm::text_file("src/widget.rs", "@@ -0,0 +1 @@\n+pub struct Widget;"),
            MockScm::text_file("src/lib.rs", "@@ -1 +1,2 @@\n mod a;\n+mod widget;"),
        ])
    }

    fn dispatcher_with(
        scm: Arc<MockScm>,
        providers: Vec<Arc<CannedProvider>>,
    ) -> (Dispatcher, Metrics) {
        let metrics = Metrics::new();
        let mut models = ModelManager::new(None, metrics.clone());
        for provider in providers {
            models.register_provider(provider);
        }
        let policies = PolicyResolver::new(scm.clone());
        let dispatcher = Dispatcher::new(
            scm,
            models,
            policies,
            ReviewTracker::new(),
            metrics.clone(),
        );
        (dispatcher, metrics)
    }

    #[tokio::test]
    async fn opened_pull_request_completes_and_posts_comment() {
        let scm = Arc::new(two_file_scm());
        let provider = CannedProvider::ok("anthropic", "Looks solid overall.");
        let (dispatcher, metrics) = dispatcher_with(scm.clone(), vec![provider.clone()]);

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        assert_eq!(outcome, DispatchOutcome::Completed { comment_id: 100 });

        let comment = scm.last_comment.lock().unwrap().clone().unwrap();
        assert!(comment.starts_with(COMMENT_HEADER));
        assert!(comment.contains("Looks solid overall."));
        assert!(comment.contains("via anthropic"));

        // Prompt carried both diffs as fenced blocks.
        let prompt = provider.last_prompt().unwrap();
        assert!(prompt.contains("pub struct Widget;"));
        assert!(prompt.contains("+mod widget;"));
        assert_eq!(prompt.matches("```diff").count(), 2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.webhooks_processed, 1);
        assert_eq!(snapshot.comments_posted, 1);
    }

    #[tokio::test]
    async fn second_delivery_within_cooldown_is_deduplicated() {
        let scm = Arc::new(two_file_scm());
        let (dispatcher, _) =
            dispatcher_with(scm.clone(), vec![CannedProvider::ok("anthropic", "ok")]);

        let first = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        assert!(matches!(first, DispatchOutcome::Completed { .. }));

        let second = dispatcher
            .handle_event("pull_request", &pr_payload("synchronize"))
            .await;
        assert_eq!(
            second,
            DispatchOutcome::Skipped {
                reason: "recently processed".into()
            }
        );
        assert_eq!(scm.comments_posted(), 1);
    }

    #[tokio::test]
    async fn stale_dedup_entry_allows_a_new_review() {
        let scm = Arc::new(two_file_scm());
        let (dispatcher, _) =
            dispatcher_with(scm.clone(), vec![CannedProvider::ok("anthropic", "ok")]);

        let key = ReviewTracker::key("acme", "widgets", 42);
        dispatcher.tracker().record_at(
            &key,
            7,
            chrono::Utc::now() - chrono::Duration::minutes(6),
        );

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Completed { .. }));
        assert_eq!(scm.comments_posted(), 1);
    }

    #[tokio::test]
    async fn no_changed_files_is_a_soft_skip() {
        let scm = Arc::new(MockScm::new());
        let (dispatcher, _) = dispatcher_with(scm.clone(), vec![CannedProvider::ok("a", "x")]);

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: "no files changed".into()
            }
        );
        assert_eq!(scm.comments_posted(), 0);
    }

    #[tokio::test]
    async fn policy_can_disable_reviews() {
        let scm = Arc::new(two_file_scm().with_policy("general:\n  enabled: false\n"));
        let (dispatcher, _) = dispatcher_with(scm.clone(), vec![CannedProvider::ok("a", "x")]);

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: "reviews disabled by policy".into()
            }
        );
        assert_eq!(scm.comments_posted(), 0);
    }

    #[tokio::test]
    async fn policy_size_bounds_gate_the_review() {
        let scm = Arc::new(two_file_scm().with_policy("general:\n  min_size: 50\n"));
        let (dispatcher, _) = dispatcher_with(scm.clone(), vec![CannedProvider::ok("a", "x")]);

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        match outcome {
            DispatchOutcome::Skipped { reason } => {
                assert!(reason.contains("outside policy bounds"), "got: {reason}")
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn policy_selects_provider_and_fallback() {
        let scm = Arc::new(two_file_scm().with_policy(
            "ai:\n  provider: alpha\n  enable_fallback: true\n  fallback_provider: beta\n",
        ));
        let alpha = CannedProvider::failing("alpha", "overloaded");
        let beta = CannedProvider::ok("beta", "rescued review");
        let (dispatcher, _) = dispatcher_with(scm.clone(), vec![alpha, beta]);

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Completed { .. }));

        let comment = scm.last_comment.lock().unwrap().clone().unwrap();
        assert!(comment.contains("rescued review"));
        assert!(comment.contains("via beta"));
        assert!(comment.contains("falling back"));
    }

    #[tokio::test]
    async fn provider_failure_becomes_user_safe_failure() {
        let scm = Arc::new(two_file_scm());
        let (dispatcher, metrics) =
            dispatcher_with(scm.clone(), vec![CannedProvider::failing("alpha", "boom")]);

        let outcome = dispatcher
            .handle_event("pull_request", &pr_payload("opened"))
            .await;
        match outcome {
            DispatchOutcome::Failed { message } => {
                assert!(message.contains("could not be completed"));
                assert!(message.contains("boom"));
                assert!(message.contains(TRIGGER_TOKEN));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(scm.comments_posted(), 0);
        assert!(metrics.snapshot().last_error.unwrap().contains("boom"));
        // A failed review must not arm the dedup window.
        assert!(!dispatcher
            .tracker()
            .recently_reviewed(&ReviewTracker::key("acme", "widgets", 42)));
    }

    #[tokio::test]
    async fn unsupported_event_makes_no_api_calls() {
        let scm = Arc::new(two_file_scm());
        let (dispatcher, _) = dispatcher_with(scm.clone(), vec![CannedProvider::ok("a", "x")]);

        let outcome = dispatcher
            .handle_event("push", &pr_payload("opened"))
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: "Unsupported event type".into()
            }
        );
        assert_eq!(scm.total_calls(), 0);
    }
}
