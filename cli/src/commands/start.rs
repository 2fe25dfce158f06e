//! `ec2-session start`: start a session, creating its volume on first use.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::session::{self as service, StartRequest};
use crate::commands::{LaunchArgs, LocationArgs};
use crate::domain::SessionName;

/// Arguments for the start and restart commands.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Session name
    pub session: SessionName,

    #[command(flatten)]
    pub location: LocationArgs,

    #[command(flatten)]
    pub launch: LaunchArgs,
}

/// Run `ec2-session start`.
///
/// # Errors
///
/// Returns an error if configuration is incomplete, the operator declines
/// creating the volume, or any provisioning step fails.
pub async fn run(args: &StartArgs, app: &AppContext) -> Result<()> {
    let session = args.location.session(&app.config, &args.session)?;
    let image = args.launch.image(&app.config)?;
    let sizing = args.launch.sizing(&app.config);
    let req = StartRequest {
        strategy: args.launch.strategy(&app.config),
        instance_name: args.launch.instance_name.as_deref(),
        image: &image,
        sizing: &sizing,
        credentials: app.credentials.as_ref(),
    };

    let outcome = service::start(
        &app.cloud,
        &app.templates,
        &app.prompt,
        &app.terminal_reporter(),
        &session,
        &req,
    )
    .await?;

    app.renderer().render_start(args.session.as_str(), &outcome)
}
