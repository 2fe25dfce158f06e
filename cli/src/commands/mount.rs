//! `ec2-session mount`: attach a shared filesystem to the session.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::session as service;
use crate::commands::LocationArgs;
use crate::domain::SessionName;

/// Arguments for the mount command.
#[derive(Args, Debug)]
pub struct MountArgs {
    /// Session name
    pub session: SessionName,

    /// Name (creation token) of the shared filesystem
    pub filesystem: String,

    #[command(flatten)]
    pub location: LocationArgs,
}

/// Run `ec2-session mount`. Creating a missing filesystem asks first.
///
/// # Errors
///
/// Returns an error if a lookup, the creation or the mount fails.
pub async fn run(args: &MountArgs, app: &AppContext) -> Result<()> {
    let session = args.location.session(&app.config, &args.session)?;
    let outcome = service::mount(
        &app.cloud,
        &app.prompt,
        &app.terminal_reporter(),
        &session,
        &args.filesystem,
    )
    .await?;
    app.renderer().render_mount(&args.filesystem, &outcome)
}
