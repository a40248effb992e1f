//! Snapshot endpoint handler.
//!
//! Assembles the full telemetry snapshot per request. Every collector
//! reads live kernel state; nothing is cached between calls except the
//! speed-test result, which is explicitly long-lived.

use std::path::Path;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, error, instrument};

use crate::command::CommandRunner;
use crate::models::{Snapshot, SpeedTestResult};
use crate::state::SharedState;
use crate::{host, net, resources, PROC_ROOT, SYS_ROOT};

/// Error type for snapshot endpoint failures.
#[derive(Debug)]
pub enum SnapshotError {
    CollectionFailed,
}

impl IntoResponse for SnapshotError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to collect snapshot",
        )
            .into_response()
    }
}

/// Handler for the /api/system endpoint.
#[instrument(skip(state))]
pub async fn snapshot_handler(
    State(state): State<SharedState>,
) -> Result<Json<Snapshot>, SnapshotError> {
    debug!("Processing /api/system request");

    let speedtest = state.speedtest.current();
    let runner = Arc::clone(&state.runner);

    // Collectors do file reads and bounded command invocations; keep them
    // off the async worker threads.
    let snapshot = tokio::task::spawn_blocking(move || build_snapshot(runner.as_ref(), speedtest))
        .await
        .map_err(|e| {
            error!("Snapshot collection task failed: {}", e);
            SnapshotError::CollectionFailed
        })?;

    Ok(Json(snapshot))
}

/// Composes all collectors into one snapshot at the default roots.
pub fn build_snapshot(runner: &dyn CommandRunner, speedtest: SpeedTestResult) -> Snapshot {
    let proc_root = Path::new(PROC_ROOT);
    let sys_root = Path::new(SYS_ROOT);

    Snapshot {
        cpu: resources::cpu_summary(proc_root),
        memory: resources::memory_summary(proc_root),
        processes: resources::process_list(proc_root),
        network: net::collect(proc_root, sys_root),
        speedtest,
        system: host::host_details(runner, proc_root),
    }
}
