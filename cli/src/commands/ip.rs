//! `ec2-session ip`: print the private address of the live instance.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::session as service;
use crate::commands::SessionArgs;

/// Run `ec2-session ip`. Prints nothing when no instance is running.
///
/// # Errors
///
/// Returns an error if a lookup fails.
pub async fn run(args: &SessionArgs, app: &AppContext) -> Result<()> {
    let session = args.location.session(&app.config, &args.session)?;
    let ip = service::ip(&app.cloud, &session).await?;
    app.renderer().render_ip(ip.as_deref())
}
