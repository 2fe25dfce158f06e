//! Network identity (ENI) addressed by its `Name` tag.
//!
//! Created once per session name and never deleted, so the private address
//! of the session survives instance churn.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::ControlPlane;
use crate::application::services::location::LocationContext;
use crate::domain::operation::{OutputFormat, name_filter, tag, zone_filter};
use crate::domain::{Operation, ProcessResult, SecurityPolicy};

/// A network interface bound to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkIdentity {
    pub id: String,
    pub region: String,
    pub security: SecurityPolicy,
}

impl std::fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (security group {})", self.id, self.security)
    }
}

/// Look up the network identity tagged `name` in the context's zone.
///
/// # Errors
///
/// Returns an error if the lookup is rejected by the control plane.
pub async fn get(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
    security: &SecurityPolicy,
) -> Result<Option<NetworkIdentity>> {
    let op = Operation::ec2("describe-network-interfaces", ctx.region())
        .arg_list("--filters", [zone_filter(ctx.zone()), name_filter(name)])
        .query("NetworkInterfaces[0].NetworkInterfaceId")
        .output(OutputFormat::Text);

    let id = cloud
        .execute(&op)
        .await?
        .optional()
        .context("failed to look up network interface")?;

    Ok(id.map(|id| NetworkIdentity {
        id,
        region: ctx.region().to_string(),
        security: security.clone(),
    }))
}

/// Create a network interface in the context's subnet and tag it `name`.
///
/// # Errors
///
/// Returns an error if the interface cannot be created or tagged.
pub async fn create(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
    security: &SecurityPolicy,
) -> Result<NetworkIdentity> {
    let subnet = ctx.subnet_id(cloud).await?;
    let op = Operation::ec2("create-network-interface", ctx.region())
        .arg("--subnet-id", subnet)
        .arg("--groups", security.id())
        .query("NetworkInterface.NetworkInterfaceId")
        .output(OutputFormat::Text);

    let id = cloud
        .execute(&op)
        .await?
        .result()
        .context("failed to create network interface")?;

    let tags = Operation::ec2("create-tags", ctx.region())
        .arg("--resources", id.as_str())
        .arg("--tags", tag("Name", name));
    cloud
        .execute(&tags)
        .await?
        .should_not_fail()
        .context("failed to tag network interface")?;

    tracing::info!(network_interface = %id, name, "created network interface");
    Ok(NetworkIdentity {
        id,
        region: ctx.region().to_string(),
        security: security.clone(),
    })
}

/// Return the existing network identity or create it.
///
/// # Errors
///
/// Returns an error if the lookup or the creation fails.
pub async fn get_or_create(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
    security: &SecurityPolicy,
) -> Result<NetworkIdentity> {
    if let Some(existing) = get(cloud, ctx, name, security).await? {
        return Ok(existing);
    }
    tracing::info!(name, "network interface not found, creating");
    create(cloud, ctx, name, security).await
}

impl NetworkIdentity {
    /// Block until the interface is detached and available.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails; the remote outcome is
    /// returned for the caller to judge.
    pub async fn wait_available(&self, cloud: &impl ControlPlane) -> Result<ProcessResult> {
        let op = Operation::ec2_wait("network-interface-available", &self.region)
            .arg("--network-interface-ids", self.id.as_str());
        cloud.execute(&op).await
    }
}
