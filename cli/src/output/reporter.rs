//! `TerminalReporter`, the terminal side of `ProgressReporter`.
//!
//! Session services report provisioning milestones through the port; this
//! type prints them with the `OutputContext` stylesheet.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Prints `→`, `✓` and `!` lines; silent when `ctx.quiet`.
///
/// Milestones are also emitted as `info` events so `--verbose` logs keep
/// them next to the control-plane requests.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        tracing::info!("{message}");
        if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        tracing::info!("{message}");
        if !self.ctx.quiet {
            println!("  {} {message}", "✓".style(self.ctx.styles.success));
        }
    }

    fn warn(&self, message: &str) {
        tracing::info!("{message}");
        if !self.ctx.quiet {
            println!("  {} {message}", "!".style(self.ctx.styles.warning));
        }
    }
}
