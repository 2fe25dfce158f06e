//! `ec2-session types`: instance type lookup for a zone.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::catalog;
use crate::domain::config::require;

/// Arguments for the types command.
#[derive(Args, Debug)]
pub struct TypesArgs {
    /// Show vCPU, memory and GPU of this type instead of listing offerings
    #[arg(long, short = 't')]
    pub instance_type: Option<String>,

    /// Region, e.g. eu-west-2
    #[arg(long)]
    pub region: Option<String>,

    /// Availability zone whose offerings are listed
    #[arg(long, short = 'z')]
    pub availability_zone: Option<String>,
}

/// Run `ec2-session types`.
///
/// # Errors
///
/// Returns `SessionError::InstanceTypeNotFound` or
/// `SessionError::NoOfferings`, or an error if the lookup fails.
pub async fn run(args: &TypesArgs, app: &AppContext) -> Result<()> {
    let region = require(
        args.region.as_deref(),
        app.config.region.as_deref(),
        "region",
        "--region",
        "EC2_REGION",
    )?;

    if let Some(instance_type) = &args.instance_type {
        let system = catalog::system_info(&app.cloud, &region, instance_type).await?;
        return app.renderer().render_system_info(&system);
    }

    let zone = require(
        args.availability_zone.as_deref(),
        app.config.availability_zone.as_deref(),
        "availability zone",
        "--availability-zone",
        "EC2_AVAILABILITY_ZONE",
    )?;
    let types = catalog::offerings(&app.cloud, &region, &zone).await?;
    app.renderer().render_offerings(&zone, &types)
}
