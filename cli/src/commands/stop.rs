//! `ec2-session stop`: terminate the instance, keeping volume and network.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::session as service;
use crate::commands::SessionArgs;

/// Run `ec2-session stop`. A session without a volume is reported, not an
/// error.
///
/// # Errors
///
/// Returns an error if a lookup or the termination fails.
pub async fn run(args: &SessionArgs, app: &AppContext) -> Result<()> {
    let session = args.location.session(&app.config, &args.session)?;
    let outcome = service::stop(&app.cloud, &app.terminal_reporter(), &session).await?;
    app.renderer().render_stop(args.session.as_str(), &outcome)
}
