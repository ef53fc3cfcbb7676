//! Webhook endpoint handler.
//!
//! Accepts tracker webhook deliveries, validates signatures, classifies the
//! notification, and dispatches it into the store, synchronously, within
//! the request. The response tells the tracker only what it can act on:
//!
//! - 401: event header missing (not tracker traffic)
//! - 403: signature invalid, or the category is not one we recognize
//! - 200: processed (or `pong` for the liveness ping)
//! - 202: recognized but not persisted: undesirable action, malformed
//!   payload, or a dropped notification the tracker may redeliver
//!
//! Anything the tracker cannot act on (malformed payloads, unresolved
//! references, store failures) is acknowledged with 202 and detailed only in
//! the operational log; a 5xx would just make the tracker retry a payload
//! that will fail the same way again.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::dispatch::{process_issue_event, process_label_event, process_milestone_event};
use crate::webhooks::{
    Changes, EventCategory, ParseError, is_desirable_issue_event, parse_issue_event,
    parse_label_event, parse_milestone_event, verify_signature,
};

/// Header naming the notification's category.
const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the scheme-prefixed payload signature.
const HEADER_SIGNATURE: &str = "x-hub-signature";

/// Response for notifications we recognize but do not persist.
const ACKNOWLEDGED: (StatusCode, &'static str) = (StatusCode::ACCEPTED, "acknowledged");
/// Response for notifications processed and persisted.
const PROCESSED: (StatusCode, &'static str) = (StatusCode::OK, "processed");
/// Response for the tracker's liveness check.
const PONG: (StatusCode, &'static str) = (StatusCode::OK, "pong");

/// Rejections surfaced to the tracker.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The event header is absent; not tracker traffic.
    #[error("missing event header")]
    MissingEventHeader,

    /// The signature header is absent, malformed, or does not match.
    #[error("invalid signature")]
    InvalidSignature,

    /// The category is not one this system handles.
    #[error("unrecognized event category: {0}")]
    UnknownCategory(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingEventHeader => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidSignature | WebhookError::UnknownCategory(_) => {
                StatusCode::FORBIDDEN
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// Routing fields probed from an issues payload before extraction.
///
/// Every field is optional so that any syntactically valid JSON object gets
/// classified rather than rejected; full validation happens during
/// extraction, once the action is known to be worth it.
#[derive(Debug, Default, Deserialize)]
struct IssuesProbe {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    changes: Option<Changes>,
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: notification category (e.g., "issues", "label")
///   - `X-Hub-Signature`: scheme-prefixed HMAC of the payload
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: notification processed (body "pong" for the liveness ping)
/// - 202 Accepted: recognized but intentionally not persisted
/// - 401 Unauthorized: event header missing
/// - 403 Forbidden: invalid signature or unrecognized category
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    // Category header first: the cheapest check, and its absence already
    // tells us this is not tracker traffic. No HMAC work is attempted.
    let event_header =
        get_header(&headers, HEADER_EVENT).ok_or(WebhookError::MissingEventHeader)?;

    let signature_header = get_header(&headers, HEADER_SIGNATURE).unwrap_or_default();
    if !verify_signature(&body, &signature_header, app_state.webhook_secret()) {
        warn!(event = %event_header, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    debug!(event = %event_header, "received webhook");

    match EventCategory::from_header(&event_header) {
        EventCategory::Ping => Ok(PONG),
        EventCategory::Issues => Ok(handle_issues(&app_state, &body)),
        EventCategory::Label => Ok(handle_label(&app_state, &body)),
        EventCategory::Milestone => Ok(handle_milestone(&app_state, &body)),
        EventCategory::Unknown => {
            info!(event = %event_header, "tracker sent an unrecognized event category");
            Err(WebhookError::UnknownCategory(event_header))
        }
    }
}

/// Handles an issues-category notification.
fn handle_issues(app_state: &AppState, body: &[u8]) -> (StatusCode, &'static str) {
    let probe: IssuesProbe = match serde_json::from_slice(body) {
        Ok(probe) => probe,
        Err(err) => {
            warn!(error = %err, "malformed issues payload");
            return ACKNOWLEDGED;
        }
    };

    let action = probe.action.unwrap_or_default();
    if !is_desirable_issue_event(&action, probe.changes.as_ref()) {
        debug!(action = %action, "issues action acknowledged without processing");
        return ACKNOWLEDGED;
    }

    let event = match parse_issue_event(body) {
        Ok(event) => event,
        Err(err) => {
            warn!(action = %action, error = %err, "malformed issues payload");
            return ACKNOWLEDGED;
        }
    };

    match process_issue_event(app_state.gateway(), &event) {
        Ok(event_id) => {
            info!(
                issue = %event.number,
                action = event.action.as_str(),
                event_id = %event_id,
                "issue notification processed"
            );
            PROCESSED
        }
        Err(err) => {
            // Dropped; the tracker's redelivery is the retry mechanism.
            warn!(issue = %event.number, error = %err, "issue notification dropped");
            ACKNOWLEDGED
        }
    }
}

/// Handles a label-category notification.
fn handle_label(app_state: &AppState, body: &[u8]) -> (StatusCode, &'static str) {
    let event = match parse_label_event(body) {
        Ok(event) => event,
        Err(ParseError::UnsupportedAction(action)) => {
            debug!(action = %action, "label action acknowledged without processing");
            return ACKNOWLEDGED;
        }
        Err(err) => {
            warn!(error = %err, "malformed label payload");
            return ACKNOWLEDGED;
        }
    };

    match process_label_event(app_state.gateway(), &event) {
        Ok(()) => {
            info!(label = %event.name, action = ?event.action, "label notification processed");
            PROCESSED
        }
        Err(err) => {
            warn!(label = %event.name, error = %err, "label notification dropped");
            ACKNOWLEDGED
        }
    }
}

/// Handles a milestone-category notification.
fn handle_milestone(app_state: &AppState, body: &[u8]) -> (StatusCode, &'static str) {
    let event = match parse_milestone_event(body) {
        Ok(event) => event,
        Err(ParseError::UnsupportedAction(action)) => {
            // The tracker also reports opened/closed milestones; we only
            // track existence and titles.
            debug!(action = %action, "milestone action acknowledged without processing");
            return ACKNOWLEDGED;
        }
        Err(err) => {
            warn!(error = %err, "malformed milestone payload");
            return ACKNOWLEDGED;
        }
    };

    match process_milestone_event(app_state.gateway(), &event) {
        Ok(()) => {
            info!(
                milestone = %event.title,
                action = ?event.action,
                "milestone notification processed"
            );
            PROCESSED
        }
        Err(err) => {
            warn!(milestone = %event.title, error = %err, "milestone notification dropped");
            ACKNOWLEDGED
        }
    }
}

/// Extracts a header value as a string, if present and valid UTF-8.
fn get_header(headers: &HeaderMap, name: &'static str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", "issues".parse().unwrap());

        assert_eq!(
            get_header(&headers, "x-github-event").as_deref(),
            Some("issues")
        );
    }

    #[test]
    fn get_header_missing() {
        let headers = HeaderMap::new();
        assert_eq!(get_header(&headers, "x-github-event"), None);
    }

    #[test]
    fn webhook_error_statuses() {
        assert_eq!(
            WebhookError::MissingEventHeader.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::InvalidSignature.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WebhookError::UnknownCategory("deployment".into())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn issues_probe_tolerates_minimal_payloads() {
        let probe: IssuesProbe = serde_json::from_slice(b"{}").unwrap();
        assert_eq!(probe.action, None);
        assert!(probe.changes.is_none());

        let probe: IssuesProbe =
            serde_json::from_slice(br#"{"action": "assigned", "assignee": {}}"#).unwrap();
        assert_eq!(probe.action.as_deref(), Some("assigned"));
    }
}
