//! Health check endpoint handler.

use axum::{http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

/// Handler for the /health endpoint. The service has no degraded mode:
/// every collector fails soft, so reachable means healthy.
#[instrument]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Processing /health request");
    (
        StatusCode::OK,
        format!("OK - hostpulse {}", env!("CARGO_PKG_VERSION")),
    )
}
