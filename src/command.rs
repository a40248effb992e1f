//! Narrow capability interface for external command invocation.
//!
//! Host facts and the speed measurement shell out to auxiliary tools whose
//! output is captured as opaque text. Routing every invocation through
//! [`CommandRunner`] keeps the call sites testable with deterministic
//! fakes and keeps invocation policy out of the collectors.

use std::io;
use std::process::{Command, Stdio};

/// Captured result of one command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub success: bool,
}

/// Capability to run an external program and capture its output.
///
/// `Err` means the program could not be spawned at all; a program that
/// ran but exited non-zero is an `Ok` output with `success == false`.
pub trait CommandRunner: Send + Sync {
    fn invoke(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Production runner backed by the host's process spawning.
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn invoke(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            success: output.status.success(),
        })
    }
}

/// Trimmed stdout of a successful invocation, `None` on spawn failure or
/// non-zero exit. The common shape for best-effort fact capture.
pub fn capture(runner: &dyn CommandRunner, program: &str, args: &[&str]) -> Option<String> {
    match runner.invoke(program, args) {
        Ok(output) if output.success => Some(output.stdout.trim().to_string()),
        _ => None,
    }
}
