//! Application state shared across requests and the background job.
//!
//! Ownership is explicit: the command runner and the speed-test
//! coordinator are constructed once and injected into every handler via
//! the shared state, never reached through globals.

use std::sync::Arc;

use crate::command::{CommandRunner, SystemCommandRunner};
use crate::config::Config;
use crate::speedtest::SpeedTestCoordinator;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and the speed-test
/// worker.
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<dyn CommandRunner>,
    pub speedtest: SpeedTestCoordinator,
}

impl AppState {
    /// Builds production state with the system command runner.
    pub fn new(config: Config) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
        Self::with_runner(config, runner)
    }

    /// Builds state around an injected runner, the seam tests use.
    pub fn with_runner(config: Config, runner: Arc<dyn CommandRunner>) -> Self {
        let speedtest = SpeedTestCoordinator::new(
            Arc::clone(&runner),
            config.effective_speedtest_command().to_string(),
        );
        Self {
            config: Arc::new(config),
            runner,
            speedtest,
        }
    }
}
