//! HTTP endpoint handlers.
//!
//! - `/api/system`: full telemetry snapshot
//! - `/api/speedtest`: last speed measurement result
//! - `/api/speedtest/start`: start a measurement (single-flight)
//! - `/health`: liveness check

pub mod health;
pub mod snapshot;
pub mod speedtest;

// Re-export handlers
pub use health::health_handler;
pub use snapshot::snapshot_handler;
pub use speedtest::{speedtest_handler, speedtest_start_handler};
