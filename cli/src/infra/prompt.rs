//! Terminal implementation of the `Prompt` port.

use anyhow::{Context, Result};

use crate::application::ports::Prompt;

/// Asks on the terminal, or answers the default when non-interactive.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    non_interactive: bool,
}

impl TerminalPrompt {
    #[must_use]
    pub fn new(non_interactive: bool) -> Self {
        Self { non_interactive }
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        !self.non_interactive
    }
}

impl Prompt for TerminalPrompt {
    /// When non-interactive (CI, `--yes` flag, or `EC2_SESSION_YES` env),
    /// returns `default` immediately without prompting.
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .context("reading confirmation")
    }
}
