//! HTTP server for the issue ledger.
//!
//! This module implements the HTTP surface that:
//! - Accepts tracker webhooks, validates signatures, and reconciles them
//!   into the store within the request
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhooks/ghevents` - Accepts tracker webhook deliveries
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::store::Gateway;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It carries
/// the persistence gateway and the webhook secret; the secret is injected
/// here once, and the signature validator receives it as a plain parameter.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Persistence gateway all dispatching runs against.
    gateway: Arc<dyn Gateway>,

    /// Shared secret for webhook signature verification.
    webhook_secret: Vec<u8>,
}

impl AppState {
    /// Creates a new `AppState` with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Persistence gateway for entity and event storage
    /// * `webhook_secret` - Secret shared with the tracker for signatures
    pub fn new(gateway: Arc<dyn Gateway>, webhook_secret: impl Into<Vec<u8>>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                gateway,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    /// Returns the persistence gateway.
    pub fn gateway(&self) -> &dyn Gateway {
        self.inner.gateway.as_ref()
    }

    /// Returns the webhook secret.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhooks/ghevents", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::store::MemoryGateway;
    use crate::types::IssueNumber;
    use crate::webhooks::{
        IssueAction, SignatureScheme, compute_signature, format_signature_header,
    };

    const SECRET: &[u8] = b"test-secret";

    /// Creates a router plus a handle onto its gateway for inspection.
    fn test_app() -> (axum::Router, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new());
        let state = AppState::new(gateway.clone(), SECRET.to_vec());
        (build_router(state), gateway)
    }

    /// Creates a webhook request signed with the given secret.
    fn signed_request(secret: &[u8], event_type: &str, body: &serde_json::Value) -> Request<Body> {
        let body_bytes = serde_json::to_vec(body).unwrap();
        let signature = compute_signature(SignatureScheme::Sha1, &body_bytes, secret);
        let signature_header = format_signature_header(SignatureScheme::Sha1, &signature);

        Request::builder()
            .method("POST")
            .uri("/webhooks/ghevents")
            .header("content-type", "application/json")
            .header("x-github-event", event_type)
            .header("x-hub-signature", signature_header)
            .body(Body::from(body_bytes))
            .unwrap()
    }

    fn issues_body(action: &str, extra: serde_json::Value) -> serde_json::Value {
        let mut body = json!({
            "action": action,
            "issue": {
                "number": 42,
                "title": "Site broken on load",
                "created_at": "2018-07-30T13:22:36Z",
                "updated_at": "2018-07-30T13:22:36Z",
                "milestone": null
            },
            "sender": { "login": "alice" }
        });
        if let Some(map) = extra.as_object() {
            for (k, v) in map {
                body[k.as_str()] = v.clone();
            }
        }
        body
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ─── Health endpoint ───

    #[tokio::test]
    async fn health_returns_200() {
        let (app, _) = test_app();

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    // ─── Authentication ───

    #[tokio::test]
    async fn missing_event_header_returns_401() {
        let (app, gateway) = test_app();

        let body = issues_body("opened", json!({}));
        let body_bytes = serde_json::to_vec(&body).unwrap();
        let signature = compute_signature(SignatureScheme::Sha1, &body_bytes, SECRET);

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/ghevents")
            .header("content-type", "application/json")
            .header(
                "x-hub-signature",
                format_signature_header(SignatureScheme::Sha1, &signature),
            )
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(gateway.issue(IssueNumber(42)).is_none());
    }

    #[tokio::test]
    async fn missing_signature_returns_403() {
        let (app, gateway) = test_app();

        let body = issues_body("opened", json!({}));
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/ghevents")
            .header("content-type", "application/json")
            .header("x-github-event", "issues")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(gateway.issue(IssueNumber(42)).is_none());
    }

    #[tokio::test]
    async fn bogus_signature_returns_403() {
        let (app, gateway) = test_app();

        let body = issues_body("opened", json!({}));
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/ghevents")
            .header("content-type", "application/json")
            .header("x-github-event", "issues")
            .header("x-hub-signature", "Boo!")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(gateway.issue(IssueNumber(42)).is_none());
    }

    #[tokio::test]
    async fn wrong_secret_returns_403() {
        let (app, gateway) = test_app();

        let request = signed_request(b"wrong-secret", "issues", &issues_body("opened", json!({})));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(gateway.issue(IssueNumber(42)).is_none());
    }

    #[tokio::test]
    async fn sha256_signatures_are_accepted() {
        let (app, gateway) = test_app();

        let body = issues_body("opened", json!({}));
        let body_bytes = serde_json::to_vec(&body).unwrap();
        let signature = compute_signature(SignatureScheme::Sha256, &body_bytes, SECRET);

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/ghevents")
            .header("content-type", "application/json")
            .header("x-github-event", "issues")
            .header(
                "x-hub-signature",
                format_signature_header(SignatureScheme::Sha256, &signature),
            )
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.issue(IssueNumber(42)).is_some());
    }

    // ─── Classification ───

    #[tokio::test]
    async fn ping_returns_pong() {
        let (app, _) = test_app();

        let request = signed_request(SECRET, "ping", &json!({"zen": "Design for failure."}));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "pong");
    }

    #[tokio::test]
    async fn unknown_category_returns_403() {
        let (app, _) = test_app();

        let request = signed_request(SECRET, "deployment", &json!({"action": "created"}));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn undesirable_issue_action_returns_202() {
        let (app, gateway) = test_app();

        let request = signed_request(SECRET, "issues", &issues_body("assigned", json!({})));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(gateway.issue(IssueNumber(42)).is_none());
        assert!(gateway.events().is_empty());
    }

    #[tokio::test]
    async fn body_only_edit_returns_202() {
        let (app, gateway) = test_app();

        let body = issues_body(
            "edited",
            json!({"changes": {"body": {"from": "old words"}}}),
        );
        let request = signed_request(SECRET, "issues", &body);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(gateway.events().is_empty());
    }

    // ─── Malformed payloads (fail-soft) ───

    #[tokio::test]
    async fn malformed_json_with_valid_signature_returns_202() {
        let (app, gateway) = test_app();

        let body_bytes = b"{not json".to_vec();
        let signature = compute_signature(SignatureScheme::Sha1, &body_bytes, SECRET);

        let request = Request::builder()
            .method("POST")
            .uri("/webhooks/ghevents")
            .header("content-type", "application/json")
            .header("x-github-event", "issues")
            .header(
                "x-hub-signature",
                format_signature_header(SignatureScheme::Sha1, &signature),
            )
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        // Not a server error, and nothing persisted
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(gateway.issue(IssueNumber(42)).is_none());
        assert!(gateway.events().is_empty());
        assert_eq!(gateway.label_count(), 0);
        assert_eq!(gateway.milestone_count(), 0);
    }

    #[tokio::test]
    async fn desirable_action_with_missing_fields_returns_202() {
        let (app, gateway) = test_app();

        // Desirable action but no issue object at all
        let request = signed_request(SECRET, "issues", &json!({"action": "opened"}));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(gateway.events().is_empty());
    }

    // ─── Issue processing ───

    #[tokio::test]
    async fn opened_issue_is_persisted_with_one_event() {
        let (app, gateway) = test_app();

        let request = signed_request(SECRET, "issues", &issues_body("opened", json!({})));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let issue = gateway.issue(IssueNumber(42)).unwrap();
        assert_eq!(issue.title, "Site broken on load");
        assert!(issue.is_open);
        assert_eq!(issue.milestone, None);

        let events = gateway.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].issue, IssueNumber(42));
        assert_eq!(events[0].actor, "alice");
        assert_eq!(events[0].action, IssueAction::Opened);
        assert_eq!(events[0].detail, None);
    }

    #[tokio::test]
    async fn labeled_with_unknown_label_is_dropped_with_202() {
        let (app, gateway) = test_app();

        let opened = signed_request(SECRET, "issues", &issues_body("opened", json!({})));
        app.clone().oneshot(opened).await.unwrap();

        let labeled = signed_request(
            SECRET,
            "issues",
            &issues_body("labeled", json!({"label": {"name": "ghost"}})),
        );
        let response = app.oneshot(labeled).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(gateway.issue(IssueNumber(42)).unwrap().labels.is_empty());
        // Only the opened record persists
        assert_eq!(gateway.events().len(), 1);
    }

    #[tokio::test]
    async fn label_lifecycle_round_trips_through_the_endpoint() {
        let (app, gateway) = test_app();

        let created = signed_request(
            SECRET,
            "label",
            &json!({"action": "created", "label": {"name": "bug", "color": "e11d21"}}),
        );
        let response = app.clone().oneshot(created).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.label("bug").is_some());

        let renamed = signed_request(
            SECRET,
            "label",
            &json!({
                "action": "edited",
                "label": {"name": "defect"},
                "changes": {"name": {"from": "bug"}}
            }),
        );
        let response = app.clone().oneshot(renamed).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Renamed in place: no new row
        assert!(gateway.label("bug").is_none());
        assert!(gateway.label("defect").is_some());
        assert_eq!(gateway.label_count(), 1);

        let deleted = signed_request(
            SECRET,
            "label",
            &json!({"action": "deleted", "label": {"name": "defect"}}),
        );
        let response = app.oneshot(deleted).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(gateway.label_count(), 0);
    }

    #[tokio::test]
    async fn milestone_created_and_deleted_through_the_endpoint() {
        let (app, gateway) = test_app();

        let created = signed_request(
            SECRET,
            "milestone",
            &json!({"action": "created", "milestone": {"title": "needstriage"}}),
        );
        let response = app.clone().oneshot(created).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.milestone("needstriage").is_some());

        let deleted = signed_request(
            SECRET,
            "milestone",
            &json!({"action": "deleted", "milestone": {"title": "needstriage"}}),
        );
        let response = app.oneshot(deleted).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(gateway.milestone_count(), 0);
    }

    #[tokio::test]
    async fn milestone_closed_action_returns_202() {
        let (app, gateway) = test_app();

        let request = signed_request(
            SECRET,
            "milestone",
            &json!({"action": "closed", "milestone": {"title": "needstriage"}}),
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(gateway.milestone_count(), 0);
    }

    #[tokio::test]
    async fn full_issue_lifecycle_through_the_endpoint() {
        let (app, gateway) = test_app();

        for (event_type, body) in [
            (
                "milestone",
                json!({"action": "created", "milestone": {"title": "needsdiagnosis"}}),
            ),
            (
                "label",
                json!({"action": "created", "label": {"name": "browser-firefox"}}),
            ),
            ("issues", issues_body("opened", json!({}))),
            (
                "issues",
                issues_body(
                    "milestoned",
                    json!({
                        "issue": {
                            "number": 42,
                            "title": "Site broken on load",
                            "created_at": "2018-07-30T13:22:36Z",
                            "updated_at": "2018-07-30T13:25:00Z",
                            "milestone": {"title": "needsdiagnosis"}
                        },
                        "milestone": {"title": "needsdiagnosis"}
                    }),
                ),
            ),
            (
                "issues",
                issues_body("labeled", json!({"label": {"name": "browser-firefox"}})),
            ),
            ("issues", issues_body("closed", json!({}))),
        ] {
            let response = app
                .clone()
                .oneshot(signed_request(SECRET, event_type, &body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "failed on {event_type}");
        }

        let issue = gateway.issue(IssueNumber(42)).unwrap();
        assert!(!issue.is_open);
        assert_eq!(issue.milestone.as_deref(), Some("needsdiagnosis"));
        assert!(issue.labels.contains("browser-firefox"));

        // opened, milestoned, labeled, closed
        assert_eq!(gateway.events().len(), 4);
    }
}
