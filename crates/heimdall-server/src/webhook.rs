//! Webhook endpoint handler.
//!
//! Verifies the delivery signature before anything else — an invalid
//! signature is answered with 401 and no further processing. Everything
//! after that answers 200: skips, completions, and even review failures,
//! so the sender never enters a retry storm.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::dispatch::DispatchOutcome;
use crate::signature::verify_signature;
use crate::AppState;

/// Header carrying the event type name.
const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the HMAC-SHA256 signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// JSON body returned for every accepted delivery.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// Whether a review was generated and posted.
    pub processed: bool,
    /// Why the delivery was skipped, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Id of the posted review comment, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<u64>,
    /// User-safe failure text, when review execution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DispatchOutcome> for WebhookResponse {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Skipped { reason } => Self {
                processed: false,
                reason: Some(reason),
                ..Self::default()
            },
            DispatchOutcome::Completed { comment_id } => Self {
                processed: true,
                comment_id: Some(comment_id),
                ..Self::default()
            },
            DispatchOutcome::Failed { message } => Self {
                processed: false,
                error: Some(message),
                ..Self::default()
            },
        }
    }
}

/// `POST /webhook` — accept one delivery.
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, HEADER_SIGNATURE);
    if !verify_signature(&body, signature, state.webhook_secret()) {
        warn!("invalid webhook signature");
        return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
    }

    state.metrics().incr_webhooks_received();

    let event_type = header_str(&headers, HEADER_EVENT).to_string();
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "invalid webhook JSON payload");
            let response = WebhookResponse {
                processed: false,
                reason: Some("invalid JSON payload".into()),
                ..WebhookResponse::default()
            };
            return (StatusCode::OK, Json(response)).into_response();
        }
    };

    let outcome = state.dispatcher().handle_event(&event_type, &payload).await;
    (StatusCode::OK, Json(WebhookResponse::from(outcome))).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
