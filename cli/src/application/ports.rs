//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::Output;

use anyhow::Result;

use crate::domain::Operation;
use crate::domain::ProcessResult;
use crate::domain::launch::{BootPayload, BootTemplate};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Control Plane Port ────────────────────────────────────────────────────────

/// Executes one control-plane operation and classifies its outcome.
///
/// `Err` is reserved for transport problems (spawn failure, timeout). A
/// remote rejection is a successful call returning `ProcessResult::Failed`.
#[allow(async_fn_in_trait)]
pub trait ControlPlane {
    /// Run `operation` in its region and wait for the response.
    ///
    /// Wait operations block until the remote condition holds or the
    /// transport's own ceiling is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot complete the call.
    async fn execute(&self, operation: &Operation) -> Result<ProcessResult>;
}

// ── Template Port ─────────────────────────────────────────────────────────────

/// Renders boot scripts into launch-ready payloads.
pub trait TemplateRenderer {
    /// Substitute `vars` into `template` and encode the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unknown or a placeholder is left
    /// unresolved.
    fn render(&self, template: BootTemplate, vars: &[(&str, &str)]) -> Result<BootPayload>;
}

// ── Confirmation Port ─────────────────────────────────────────────────────────

/// Asks the operator a yes/no question.
pub trait Prompt {
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
