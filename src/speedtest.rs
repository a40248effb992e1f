//! Single-flight coordinator for the network speed measurement job.
//!
//! The coordinator owns the one process-wide [`SpeedTestResult`] behind an
//! exclusive lock and guarantees at most one measurement in flight. The
//! external tool runs on the blocking pool, entirely outside the lock, so
//! status reads never wait on a running measurement. There is no
//! cancellation and no coordinator-imposed timeout; a job runs to
//! completion or failure.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::CommandRunner;
use crate::models::SpeedTestResult;

/// Default external measurement tool.
pub const DEFAULT_SPEEDTEST_COMMAND: &str = "speedtest-cli";

/// Completion timestamp format on the wire.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of a start request.
#[derive(Debug)]
pub enum StartOutcome {
    /// Job accepted. The handle resolves when the measurement finishes;
    /// dropping it detaches the job, which still runs to completion.
    Started(JoinHandle<()>),
    /// A measurement is already in flight. Existing state is untouched.
    AlreadyRunning,
}

/// Owns the shared result cell and the single-flight start contract.
pub struct SpeedTestCoordinator {
    slot: Arc<Mutex<SpeedTestResult>>,
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl SpeedTestCoordinator {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(SpeedTestResult::default())),
            runner,
            command: command.into(),
        }
    }

    /// Non-blocking read of the current result, whatever state the job
    /// is in.
    pub fn current(&self) -> SpeedTestResult {
        self.slot.lock().expect("speed-test slot lock poisoned").clone()
    }

    /// Starts a measurement unless one is already running.
    ///
    /// On acceptance the running flag flips and any prior error clears
    /// before the worker is spawned; the call returns immediately without
    /// waiting for completion.
    pub fn start(&self) -> StartOutcome {
        {
            let mut slot = self.slot.lock().expect("speed-test slot lock poisoned");
            if slot.running {
                debug!("Rejecting speed-test start: measurement already in flight");
                return StartOutcome::AlreadyRunning;
            }
            slot.running = true;
            slot.error.clear();
        }

        let slot = Arc::clone(&self.slot);
        let runner = Arc::clone(&self.runner);
        let command = self.command.clone();
        let handle =
            tokio::task::spawn_blocking(move || run_measurement(&slot, runner.as_ref(), &command));

        StartOutcome::Started(handle)
    }
}

/// Worker body. Tool invocations happen before the lock is taken; the
/// finalization is one straight-line tail under a single short lock
/// acquisition, so every path clears the running flag and stamps the
/// completion time exactly once.
fn run_measurement(slot: &Mutex<SpeedTestResult>, runner: &dyn CommandRunner, command: &str) {
    info!("Starting speed measurement via {}", command);

    let report = match runner.invoke(command, &["--simple"]) {
        Ok(output) if output.success => Ok(parse_simple_report(&output.stdout)),
        Ok(_) => Err(format!("{command} exited with an error")),
        Err(e) => Err(format!("Failed to run {command}: {e}")),
    };

    // Server description is best-effort and only worth fetching after a
    // successful measurement.
    let server = if report.is_ok() {
        match runner.invoke(command, &["--list"]) {
            Ok(output) if output.success => pick_server_line(&output.stdout),
            _ => None,
        }
    } else {
        None
    };

    let mut slot = slot.lock().expect("speed-test slot lock poisoned");
    match report {
        Ok(report) => {
            // Absent or malformed lines leave the prior value standing.
            if let Some(ping) = report.ping {
                slot.ping = ping;
            }
            if let Some(download) = report.download {
                slot.download = download;
            }
            if let Some(upload) = report.upload {
                slot.upload = upload;
            }
            info!(
                "Speed measurement completed: ping {} / down {} / up {}",
                slot.ping, slot.download, slot.upload
            );
        }
        Err(message) => {
            warn!("Speed measurement failed: {}", message);
            slot.error = message;
        }
    }
    if let Some(server) = server {
        slot.server = server;
    }
    slot.running = false;
    slot.last_updated = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
}

/// Labeled numeric fields parsed from the tool's simple report.
#[derive(Debug, Default, PartialEq)]
struct SimpleReport {
    ping: Option<f64>,
    download: Option<f64>,
    upload: Option<f64>,
}

/// Scans the line-oriented report for known prefixes, taking the second
/// whitespace-delimited token of each matching line.
fn parse_simple_report(output: &str) -> SimpleReport {
    let mut report = SimpleReport::default();
    for line in output.lines() {
        let line = line.trim();
        if line.starts_with("Ping:") {
            report.ping = second_token(line).or(report.ping);
        } else if line.starts_with("Download:") {
            report.download = second_token(line).or(report.download);
        } else if line.starts_with("Upload:") {
            report.upload = second_token(line).or(report.upload);
        }
    }
    report
}

fn second_token(line: &str) -> Option<f64> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// First plausible server line of the list-mode output.
fn pick_server_line(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains(')') && line.len() > 10)
        .map(|line| line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_report_parses_labeled_lines() {
        let output = "Ping: 12.345 ms\nDownload: 93.41 Mbit/s\nUpload: 10.22 Mbit/s\n";
        let report = parse_simple_report(output);
        assert_eq!(report.ping, Some(12.345));
        assert_eq!(report.download, Some(93.41));
        assert_eq!(report.upload, Some(10.22));
    }

    #[test]
    fn absent_and_malformed_lines_leave_fields_unset() {
        let report = parse_simple_report("Download: fast\nRetrieving configuration...\n");
        assert_eq!(report, SimpleReport::default());
    }

    #[test]
    fn report_lines_may_be_indented() {
        let report = parse_simple_report("  Ping: 8.1 ms\n");
        assert_eq!(report.ping, Some(8.1));
    }

    #[test]
    fn server_line_needs_parenthesis_and_length() {
        let output = "Retrieving speedtest.net server list...\n\
 1234) Example ISP (Springfield, US) [12.34 km]\n\
 5678) Other ISP (Shelbyville, US) [40.00 km]\n";
        assert_eq!(
            pick_server_line(output),
            Some("1234) Example ISP (Springfield, US) [12.34 km]".to_string())
        );
        assert_eq!(pick_server_line("(x)\nno markers here\n"), None);
    }
}
