//! Instance type catalog lookups.

use anyhow::{Context, Result};

use crate::application::ports::ControlPlane;
use crate::application::services::instance::describe_instance_type;
use crate::domain::Operation;
use crate::domain::error::SessionError;
use crate::domain::instance::SystemInfo;
use crate::domain::operation::OutputFormat;

/// Hardware of `instance_type` in `region`.
///
/// # Errors
///
/// Returns `SessionError::InstanceTypeNotFound` when the region does not
/// offer the type, or an error if the lookup fails.
pub async fn system_info(
    cloud: &impl ControlPlane,
    region: &str,
    instance_type: &str,
) -> Result<SystemInfo> {
    describe_instance_type(cloud, region, instance_type)
        .await?
        .map(SystemInfo::from)
        .ok_or_else(|| {
            SessionError::InstanceTypeNotFound {
                instance_type: instance_type.to_string(),
                region: region.to_string(),
            }
            .into()
        })
}

/// Instance types offered in `zone`, sorted and deduplicated.
///
/// # Errors
///
/// Returns `SessionError::NoOfferings` when nothing is offered, or an error
/// if the lookup fails.
pub async fn offerings(cloud: &impl ControlPlane, region: &str, zone: &str) -> Result<Vec<String>> {
    let op = Operation::ec2("describe-instance-type-offerings", region)
        .arg("--location-type", "availability-zone")
        .arg("--filters", format!("Name=location,Values={zone}"))
        .query("InstanceTypeOfferings[*].InstanceType")
        .output(OutputFormat::Text);

    let listing = cloud
        .execute(&op)
        .await?
        .optional()
        .context("failed to list instance type offerings")?
        .ok_or_else(|| SessionError::NoOfferings(zone.to_string()))?;

    let mut types: Vec<String> = listing.split_whitespace().map(str::to_string).collect();
    types.sort();
    types.dedup();
    Ok(types)
}
