//! `ec2-session status`: one-shot snapshot of a session.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::session as service;
use crate::commands::SessionArgs;
use crate::output::progress;

/// Run `ec2-session status`. Never creates anything.
///
/// # Errors
///
/// Returns an error if the location cannot be resolved or a lookup fails.
pub async fn run(args: &SessionArgs, app: &AppContext) -> Result<()> {
    let session = args.location.session(&app.config, &args.session)?;

    let pb = progress::spinner_for(&app.output, "Gathering session status...");
    let report = service::status(&app.cloud, &session).await;
    pb.finish_and_clear();

    app.renderer().render_status(&report?)
}
