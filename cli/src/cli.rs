//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Persistent cloud work sessions: one volume, one network interface and a
/// disposable instance, all keyed by a session name
#[derive(Parser)]
#[command(
    name = "ec2-session",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log control-plane requests to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show volume, network interface and instance of a session
    Status(commands::SessionArgs),

    /// Start a session, creating its volume on first use
    Start(commands::start::StartArgs),

    /// Terminate the session instance (volume and network are kept)
    Stop(commands::SessionArgs),

    /// Stop, then start with a possibly different type or strategy
    Restart(commands::start::StartArgs),

    /// Print the private address of the session instance
    Ip(commands::SessionArgs),

    /// Mount a shared filesystem on the session instance
    Mount(commands::mount::MountArgs),

    /// Describe an instance type, or list the types offered in a zone
    Types(commands::types::TypesArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            verbose: _,
            command,
        } = self;

        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        })?;

        match command {
            Command::Status(args) => commands::status::run(&args, &app).await,
            Command::Start(args) => commands::start::run(&args, &app).await,
            Command::Stop(args) => commands::stop::run(&args, &app).await,
            Command::Restart(args) => commands::restart::run(&args, &app).await,
            Command::Ip(args) => commands::ip::run(&args, &app).await,
            Command::Mount(args) => commands::mount::run(&args, &app).await,
            Command::Types(args) => commands::types::run(&args, &app).await,
        }
    }
}
