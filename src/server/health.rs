//! Health check endpoint for liveness probes.
//!
//! Load balancers and orchestration systems probe this endpoint; the
//! tracker's own liveness check travels through the webhook endpoint
//! instead, as a signed `ping` notification.

/// Health check handler: 200 OK with the text "OK" whenever the server is
/// accepting connections.
pub async fn health_handler() -> &'static str {
    "OK"
}
