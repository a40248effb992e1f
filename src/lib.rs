//! Host telemetry snapshot service.
//!
//! Collects CPU, memory, process, network, and host-identity metrics from
//! the kernel's pseudo-filesystems and serves them as a single JSON
//! snapshot, plus coordinates an on-demand, single-flight network speed
//! measurement whose last result is cached and queryable.

pub mod cli;
pub mod command;
pub mod config;
pub mod handlers;
pub mod host;
pub mod models;
pub mod net;
pub mod procfs;
pub mod resources;
pub mod speedtest;
pub mod state;

/// Root of the process pseudo-filesystem read by the collectors.
pub const PROC_ROOT: &str = "/proc";

/// Root of the sysfs tree used for per-interface link speed lookups.
pub const SYS_ROOT: &str = "/sys";
