//! Persistent block volume addressed by its `Name` tag.
//!
//! There is deliberately no `create`: a session volume only exists once it
//! has been promoted from a bootstrap instance's root disk
//! (see `provision::bootstrap_volume`).

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::ControlPlane;
use crate::application::services::location::LocationContext;
use crate::domain::instance::LifecycleState;
use crate::domain::operation::{OutputFormat, name_filter, zone_filter};
use crate::domain::process::first_token;
use crate::domain::{Operation, ProcessResult};

/// A block volume in a known region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub region: String,
}

impl std::fmt::Display for Volume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.name)
    }
}

/// Look up the volume tagged `name` in the context's zone.
///
/// # Errors
///
/// Returns an error if the lookup is rejected by the control plane.
pub async fn get(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
) -> Result<Option<Volume>> {
    let op = Operation::ec2("describe-volumes", ctx.region())
        .arg_list("--filters", [name_filter(name), zone_filter(ctx.zone())])
        .query("Volumes[0].VolumeId")
        .output(OutputFormat::Text);

    let id = cloud
        .execute(&op)
        .await?
        .optional()
        .context("failed to look up volume")?;

    Ok(id.map(|id| Volume {
        id,
        name: name.to_string(),
        region: ctx.region().to_string(),
    }))
}

impl Volume {
    /// Id of the instance the volume is attached to, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup is rejected by the control plane.
    pub async fn attached_instance_id(&self, cloud: &impl ControlPlane) -> Result<Option<String>> {
        let op = Operation::ec2("describe-volumes", &self.region)
            .arg("--volume-ids", self.id.as_str())
            .query("Volumes[0].Attachments[0].InstanceId")
            .output(OutputFormat::Text);

        let id = cloud
            .execute(&op)
            .await?
            .optional()
            .context("failed to read volume attachment")?;
        Ok(id.map(|id| first_token(&id).to_string()))
    }

    /// Block until the volume is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails; the remote outcome is
    /// returned for the caller to judge.
    pub async fn wait_available(&self, cloud: &impl ControlPlane) -> Result<ProcessResult> {
        let op = Operation::ec2_wait("volume-available", &self.region)
            .arg("--volume-ids", self.id.as_str());
        cloud.execute(&op).await
    }

    /// Block until the volume is attached and in use.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails; the remote outcome is
    /// returned for the caller to judge.
    pub async fn wait_in_use(&self, cloud: &impl ControlPlane) -> Result<ProcessResult> {
        let op = Operation::ec2_wait("volume-in-use", &self.region)
            .arg("--volume-ids", self.id.as_str());
        cloud.execute(&op).await
    }

    /// Force-detach the volume when its owner will never release it.
    ///
    /// An owner that no longer exists or sits in a terminal state leaves the
    /// volume stuck in `in-use`. Returns whether a detach happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment cannot be inspected, the detach is
    /// rejected, or the volume never becomes available.
    pub async fn force_detach_if_stale(&self, cloud: &impl ControlPlane) -> Result<bool> {
        let Some(owner) = self.attached_instance_id(cloud).await? else {
            return Ok(false);
        };

        let op = Operation::ec2("describe-instances", &self.region)
            .arg("--instance-ids", owner.as_str())
            .query("Reservations[0].Instances[0].State.Name")
            .output(OutputFormat::Text);

        let state = match cloud.execute(&op).await? {
            ProcessResult::Ok(state) => Some(LifecycleState::parse(&state)),
            ProcessResult::Empty { .. } => None,
            ProcessResult::Failed(err) if err.is_not_found() => None,
            ProcessResult::Failed(err) => {
                return Err(err).context("failed to read state of volume owner");
            }
        };

        if state.is_some_and(|s| !s.is_terminal()) {
            return Ok(false);
        }

        tracing::warn!(volume = %self.id, instance = %owner, ?state, "force-detaching stale volume");
        let detach = Operation::ec2("detach-volume", &self.region)
            .arg("--volume-id", self.id.as_str())
            .switch("--force");
        cloud
            .execute(&detach)
            .await?
            .should_not_fail()
            .context("failed to detach stale volume")?;

        self.wait_available(cloud)
            .await?
            .should_not_fail()
            .context("volume did not become available after detach")?;
        Ok(true)
    }
}
