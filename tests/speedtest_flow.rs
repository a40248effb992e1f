//! End-to-end coordinator behavior against deterministic fake runners:
//! single-flight starts, completion on success and failure, and restart
//! after a failed job.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use hostpulse::command::{CommandOutput, CommandRunner};
use hostpulse::speedtest::{SpeedTestCoordinator, StartOutcome};

const SIMPLE_REPORT: &str = "Ping: 12.345 ms\nDownload: 93.41 Mbit/s\nUpload: 10.22 Mbit/s\n";
const SERVER_LIST: &str = "Retrieving speedtest.net server list...\n\
 1234) Example ISP (Springfield, US) [12.34 km]\n";

/// Runner whose measurement blocks until the test releases a gate.
struct GatedRunner {
    gate: Mutex<Option<Receiver<()>>>,
    simple_calls: AtomicUsize,
}

impl GatedRunner {
    fn new(gate: Receiver<()>) -> Self {
        Self {
            gate: Mutex::new(Some(gate)),
            simple_calls: AtomicUsize::new(0),
        }
    }
}

impl CommandRunner for GatedRunner {
    fn invoke(&self, _program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        if args == ["--simple"] {
            self.simple_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = self.gate.lock().unwrap().take() {
                let _ = gate.recv();
            }
            Ok(CommandOutput {
                stdout: SIMPLE_REPORT.to_string(),
                success: true,
            })
        } else {
            Ok(CommandOutput {
                stdout: SERVER_LIST.to_string(),
                success: true,
            })
        }
    }
}

/// Runner that cannot spawn the tool at all.
struct MissingToolRunner;

impl CommandRunner for MissingToolRunner {
    fn invoke(&self, program: &str, _args: &[&str]) -> io::Result<CommandOutput> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{program}: command not found"),
        ))
    }
}

/// Runner that fails the first measurement and succeeds afterwards.
struct FlakyRunner {
    simple_calls: AtomicUsize,
}

impl CommandRunner for FlakyRunner {
    fn invoke(&self, _program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        if args == ["--simple"] {
            let call = self.simple_calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                return Ok(CommandOutput {
                    stdout: String::new(),
                    success: false,
                });
            }
            return Ok(CommandOutput {
                stdout: SIMPLE_REPORT.to_string(),
                success: true,
            });
        }
        Ok(CommandOutput {
            stdout: SERVER_LIST.to_string(),
            success: true,
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn second_start_joins_the_running_job() {
    let (release, gate) = std::sync::mpsc::channel();
    let runner = Arc::new(GatedRunner::new(gate));
    let coordinator = SpeedTestCoordinator::new(runner.clone(), "speedtest-cli");

    let first = coordinator.start();
    let StartOutcome::Started(handle) = first else {
        panic!("first start must be accepted");
    };

    // While the measurement is gated: running is observable, a second
    // start is rejected, and the cached result is untouched.
    assert!(matches!(
        coordinator.start(),
        StartOutcome::AlreadyRunning
    ));
    let mid_flight = coordinator.current();
    assert!(mid_flight.running);
    assert_eq!(mid_flight.download, 0.0);
    assert!(mid_flight.last_updated.is_empty());

    release.send(()).unwrap();
    handle.await.unwrap();

    // Exactly one execution of the external tool.
    assert_eq!(runner.simple_calls.load(Ordering::SeqCst), 1);

    let result = coordinator.current();
    assert!(!result.running);
    assert_eq!(result.ping, 12.345);
    assert_eq!(result.download, 93.41);
    assert_eq!(result.upload, 10.22);
    assert_eq!(
        result.server,
        "1234) Example ISP (Springfield, US) [12.34 km]"
    );
    assert!(result.error.is_empty());
    assert!(!result.last_updated.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_job_records_error_and_leaves_numbers_unchanged() {
    let coordinator =
        SpeedTestCoordinator::new(Arc::new(MissingToolRunner), "speedtest-cli");

    let StartOutcome::Started(handle) = coordinator.start() else {
        panic!("start must be accepted");
    };
    handle.await.unwrap();

    let result = coordinator.current();
    assert!(!result.running);
    assert!(result.error.contains("speedtest-cli"));
    assert_eq!(result.download, 0.0);
    assert_eq!(result.upload, 0.0);
    assert_eq!(result.ping, 0.0);
    // Completion is stamped on the failure path too.
    assert!(!result.last_updated.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_does_not_block_a_retry_and_retry_clears_the_error() {
    let coordinator = SpeedTestCoordinator::new(
        Arc::new(FlakyRunner {
            simple_calls: AtomicUsize::new(0),
        }),
        "speedtest-cli",
    );

    let StartOutcome::Started(first) = coordinator.start() else {
        panic!("first start must be accepted");
    };
    first.await.unwrap();
    assert!(!coordinator.current().error.is_empty());

    let StartOutcome::Started(second) = coordinator.start() else {
        panic!("retry after failure must be accepted");
    };
    second.await.unwrap();

    let result = coordinator.current();
    assert!(result.error.is_empty());
    assert!(!result.running);
    assert_eq!(result.download, 93.41);
}
