//! Speed-test endpoint handlers.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use tracing::{debug, instrument};

use crate::models::SpeedTestResult;
use crate::speedtest::StartOutcome;
use crate::state::SharedState;

/// Handler for the /api/speedtest endpoint: the current result,
/// non-blocking regardless of a running job.
#[instrument(skip(state))]
pub async fn speedtest_handler(State(state): State<SharedState>) -> Json<SpeedTestResult> {
    debug!("Processing /api/speedtest request");
    Json(state.speedtest.current())
}

/// Handler for the /api/speedtest/start endpoint.
///
/// A second start while a job is in flight is acknowledged with a
/// distinct error body, not an error status; existing state is untouched.
#[instrument(skip(state))]
pub async fn speedtest_start_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /api/speedtest/start request");

    match state.speedtest.start() {
        StartOutcome::Started(_handle) => {
            // The handle is dropped here: in the server the job is
            // deliberately detached and observed through /api/speedtest.
            Json(json!({"status": "started"}))
        }
        StartOutcome::AlreadyRunning => Json(json!({"error": "Speed test already running"})),
    }
}
