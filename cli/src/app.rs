//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the control plane, the template renderer, the prompt
//! and the resolved configuration. Adding a new cross-cutting concern
//! requires only one field change here; no command signature changes.

use anyhow::Result;

use crate::domain::{Credentials, SessionConfig};
use crate::infra::aws::AwsCli;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config;
use crate::infra::prompt::TerminalPrompt;
use crate::infra::templates::EmbeddedTemplates;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Environment variable that, when present, skips confirmation prompts.
pub const ASSUME_YES_ENV: &str = "EC2_SESSION_YES";

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `EC2_SESSION_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` and passed as `&AppContext` to all
/// command handlers.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// `aws` CLI control plane.
    pub cloud: AwsCli<TokioCommandRunner>,
    /// Boot scripts compiled into the binary.
    pub templates: EmbeddedTemplates,
    /// Confirmation prompt; answers the default when non-interactive.
    pub prompt: TerminalPrompt,
    /// Config file overlaid by `EC2_*` variables.
    pub config: SessionConfig,
    /// `AWS_*` credentials for the chainload boot script, when set.
    pub credentials: Option<Credentials>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file or an `EC2_*` variable is invalid.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var(ASSUME_YES_ENV).is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let config = config::load(&config::default_path()?, std::env::vars())?;
        let credentials = config::load_credentials(std::env::vars());
        tracing::debug!(
            credentials = credentials.is_some(),
            non_interactive,
            "configuration loaded"
        );

        Ok(Self {
            // JSON mode keeps stdout for the final document.
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            cloud: AwsCli::new(TokioCommandRunner::default()),
            templates: EmbeddedTemplates,
            prompt: TerminalPrompt::new(non_interactive),
            config,
            credentials,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for session services.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
