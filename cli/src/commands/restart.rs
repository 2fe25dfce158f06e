//! `ec2-session restart`: replace the compute of a session.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::session::{self as service, StartRequest};
use crate::commands::start::StartArgs;

/// Run `ec2-session restart`. The volume survives; strategy and sizing may
/// change.
///
/// # Errors
///
/// Returns `SessionError::VolumeNotFound` if the session was never started,
/// or any error of stop and start.
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

    let (stopped, started) = service::restart(
        &app.cloud,
        &app.templates,
        &app.prompt,
        &app.terminal_reporter(),
        &session,
        &req,
    )
    .await?;

    let renderer = app.renderer();
    renderer.render_stop(args.session.as_str(), &stopped)?;
    renderer.render_start(args.session.as_str(), &started)
}
