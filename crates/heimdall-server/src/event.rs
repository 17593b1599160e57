//! Webhook event classification.
//!
//! Decides, from the event type header and JSON payload alone, whether a
//! delivery should trigger a review. No network calls happen here.

use serde_json::Value;

/// Literal marker in a comment body that requests a manual review.
pub const TRIGGER_TOKEN: &str = "/ai-review";

/// A reviewable event extracted from a webhook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub pr_number: u64,
}

/// Classification of one inbound delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventClass {
    /// The delivery should trigger a review.
    Review(ReviewRequest),
    /// The delivery is ignored, with a reason for the response body.
    Skip(&'static str),
}

/// Classify a delivery by event type and payload.
///
/// Reviewable deliveries are:
/// - `pull_request` with action `opened`, `synchronize`, or `reopened`;
/// - `issue_comment` with action `created` whose parent issue is a pull
///   request and whose body contains [`TRIGGER_TOKEN`].
///
/// # Examples
///
/// ```
/// use heimdall_server::{classify, EventClass};
/// use serde_json::json;
///
/// let payload = json!({
///     "action": "opened",
///     "pull_request": { "number": 7 },
///     "repository": { "name": "widgets", "owner": { "login": "acme" } }
/// });
/// assert!(matches!(classify("pull_request", &payload), EventClass::Review(_)));
/// assert!(matches!(classify("push", &payload), EventClass::Skip(_)));
/// ```
pub fn classify(event_type: &str, payload: &Value) -> EventClass {
    let Some((owner, repo)) = extract_repository(payload) else {
        return EventClass::Skip("Missing repository information");
    };

    match event_type {
        "pull_request" => {
            let action = payload["action"].as_str().unwrap_or("");
            if !matches!(action, "opened" | "synchronize" | "reopened") {
                return EventClass::Skip("Unsupported pull_request action");
            }
            let Some(pr_number) = payload["pull_request"]["number"].as_u64() else {
                return EventClass::Skip("Missing pull request number");
            };
            EventClass::Review(ReviewRequest {
                owner,
                repo,
                pr_number,
            })
        }
        "issue_comment" => {
            if payload["action"].as_str() != Some("created") {
                return EventClass::Skip("Unsupported issue_comment action");
            }
            if payload["issue"]["pull_request"].is_null() {
                return EventClass::Skip("Comment is not on a pull request");
            }
            let body = payload["comment"]["body"].as_str().unwrap_or("");
            if !body.contains(TRIGGER_TOKEN) {
                return EventClass::Skip("Comment does not contain review trigger");
            }
            let Some(pr_number) = payload["issue"]["number"].as_u64() else {
                return EventClass::Skip("Missing pull request number");
            };
            EventClass::Review(ReviewRequest {
                owner,
                repo,
                pr_number,
            })
        }
        _ => EventClass::Skip("Unsupported event type"),
    }
}

fn extract_repository(payload: &Value) -> Option<(String, String)> {
    let repository = payload.get("repository")?;
    let owner = repository["owner"]["login"].as_str()?;
    let name = repository["name"].as_str()?;
    Some((owner.to_string(), name.to_string()))
}
