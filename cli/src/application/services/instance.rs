//! Live compute instance bound to a session's volume and network identity.
//!
//! An `Instance` always carries a remote id; "no instance" is represented by
//! `Option<Instance>` at the lookup boundary. The provisioning variant lives
//! in [`InstanceKind`] and only decides how the instance is torn down.

use std::sync::OnceLock;

use anyhow::{Context, Result};

use crate::application::ports::ControlPlane;
use crate::application::services::filesystem::SharedFilesystem;
use crate::application::services::location::LocationContext;
use crate::application::services::network::NetworkIdentity;
use crate::application::services::volume::Volume;
use crate::domain::error::SessionError;
use crate::domain::instance::{
    DescribeInstances, InstanceHealth, InstanceKind, InstanceTypeDescription, SystemInfo,
};
use crate::domain::operation::{OutputFormat, zone_filter};
use crate::domain::process::first_token;
use crate::domain::report::InstanceReport;
use crate::domain::{Operation, ProcessResult};

/// A running (or starting) instance.
#[derive(Debug)]
pub struct Instance {
    id: String,
    kind: InstanceKind,
    network: NetworkIdentity,
    volume: Volume,
    instance_type: OnceLock<Option<String>>,
    system_info: OnceLock<Option<SystemInfo>>,
    private_ip: OnceLock<Option<String>>,
    status: OnceLock<Option<String>>,
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind.label(), self.id)
    }
}

/// Find the live instance using `volume` through `network`.
///
/// Follows the volume attachment to an instance id, then classifies the
/// described instance. Instances in a terminal state are reported as absent.
///
/// # Errors
///
/// Returns an error if a lookup is rejected or a preemptible instance
/// carries no request id.
pub async fn lookup(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    network: &NetworkIdentity,
    volume: &Volume,
) -> Result<Option<Instance>> {
    let Some(instance_id) = volume.attached_instance_id(cloud).await? else {
        return Ok(None);
    };

    let op = Operation::ec2("describe-instances", ctx.region())
        .arg("--instance-ids", instance_id.as_str())
        .arg_list("--filters", [zone_filter(ctx.zone())])
        .output(OutputFormat::Json);

    let described = match cloud.execute(&op).await? {
        ProcessResult::Failed(err) if err.is_not_found() => return Ok(None),
        other => other.optional().context("failed to describe instance")?,
    };
    let Some(raw) = described else {
        return Ok(None);
    };
    let described: DescribeInstances =
        serde_json::from_str(&raw).map_err(|e| SessionError::Malformed {
            operation: op.describe(),
            reason: e.to_string(),
        })?;
    let Some(description) = described.first() else {
        return Ok(None);
    };

    if description.state.name.is_terminal() {
        tracing::debug!(instance = %instance_id, state = ?description.state.name, "ignoring instance in terminal state");
        return Ok(None);
    }

    let kind = description.kind()?;
    Ok(Some(Instance::bind(
        description.instance_id,
        kind,
        network.clone(),
        volume.clone(),
    )))
}

/// Cancel the request behind `kind`, then ask for `instance_id` to be
/// terminated. Does not wait for anything to be released.
///
/// # Errors
///
/// Returns an error if the cancel or the termination is rejected.
pub async fn request_termination(
    cloud: &impl ControlPlane,
    region: &str,
    instance_id: &str,
    kind: &InstanceKind,
) -> Result<()> {
    if let InstanceKind::Preemptible { request_id } = kind {
        let cancel = Operation::ec2("cancel-spot-instance-requests", region)
            .arg("--spot-instance-request-ids", request_id.as_str());
        cloud
            .execute(&cancel)
            .await?
            .should_not_fail()
            .with_context(|| format!("failed to cancel request {request_id}"))?;
    }

    let terminate =
        Operation::ec2("terminate-instances", region).arg("--instance-ids", instance_id);
    cloud
        .execute(&terminate)
        .await?
        .should_not_fail()
        .with_context(|| format!("failed to terminate {}({instance_id})", kind.label()))?;
    tracing::info!(instance = %instance_id, kind = kind.label(), "terminate requested");
    Ok(())
}

impl Instance {
    /// Bind a known instance id to its session resources.
    #[must_use]
    pub fn bind(id: String, kind: InstanceKind, network: NetworkIdentity, volume: Volume) -> Self {
        Self {
            id,
            kind,
            network,
            volume,
            instance_type: OnceLock::new(),
            system_info: OnceLock::new(),
            private_ip: OnceLock::new(),
            status: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> &InstanceKind {
        &self.kind
    }

    #[must_use]
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    #[must_use]
    pub fn network(&self) -> &NetworkIdentity {
        &self.network
    }

    fn region(&self) -> &str {
        &self.volume.region
    }

    async fn describe_field(
        &self,
        cloud: &impl ControlPlane,
        field: &str,
    ) -> Result<Option<String>> {
        let op = Operation::ec2("describe-instances", self.region())
            .arg("--instance-ids", self.id.as_str())
            .query(&format!("Reservations[0].Instances[0].{field}"))
            .output(OutputFormat::Text);
        let value = cloud
            .execute(&op)
            .await?
            .optional()
            .with_context(|| format!("failed to read {field} of {self}"))?;
        Ok(value.map(|v| first_token(&v).to_string()))
    }

    /// Instance type, read once.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup is rejected.
    pub async fn instance_type(&self, cloud: &impl ControlPlane) -> Result<Option<&str>> {
        if let Some(cached) = self.instance_type.get() {
            return Ok(cached.as_deref());
        }
        let value = self.describe_field(cloud, "InstanceType").await?;
        Ok(self.instance_type.get_or_init(|| value).as_deref())
    }

    /// vCPU, memory and GPU of the instance type, read once.
    ///
    /// # Errors
    ///
    /// Returns an error if a lookup is rejected or malformed.
    pub async fn system_info(&self, cloud: &impl ControlPlane) -> Result<Option<&SystemInfo>> {
        if let Some(cached) = self.system_info.get() {
            return Ok(cached.as_ref());
        }
        let info = match self.instance_type(cloud).await? {
            Some(instance_type) => describe_instance_type(cloud, self.region(), instance_type)
                .await?
                .map(SystemInfo::from),
            None => None,
        };
        Ok(self.system_info.get_or_init(|| info).as_ref())
    }

    /// Private address, read once.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup is rejected.
    pub async fn private_ip(&self, cloud: &impl ControlPlane) -> Result<Option<&str>> {
        if let Some(cached) = self.private_ip.get() {
            return Ok(cached.as_deref());
        }
        let value = self.describe_field(cloud, "PrivateIpAddress").await?;
        Ok(self.private_ip.get_or_init(|| value).as_deref())
    }

    /// Composite lifecycle and health status line, read once.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup is rejected or malformed.
    pub async fn status(&self, cloud: &impl ControlPlane) -> Result<Option<&str>> {
        if let Some(cached) = self.status.get() {
            return Ok(cached.as_deref());
        }
        let op = Operation::ec2("describe-instance-status", self.region())
            .arg("--instance-ids", self.id.as_str())
            .query("InstanceStatuses[0]")
            .output(OutputFormat::Json);
        let raw = cloud
            .execute(&op)
            .await?
            .optional()
            .with_context(|| format!("failed to read status of {self}"))?;
        let summary = match raw {
            Some(raw) => {
                let health: InstanceHealth =
                    serde_json::from_str(&raw).map_err(|e| SessionError::Malformed {
                        operation: op.describe(),
                        reason: e.to_string(),
                    })?;
                Some(health.summary())
            }
            None => None,
        };
        Ok(self.status.get_or_init(|| summary).as_deref())
    }

    /// Gather every lazily resolved property into a report.
    ///
    /// # Errors
    ///
    /// Returns an error if any lookup fails.
    pub async fn report(&self, cloud: &impl ControlPlane) -> Result<InstanceReport> {
        Ok(InstanceReport {
            id: self.id.clone(),
            kind: self.kind.clone(),
            system: self.system_info(cloud).await?.cloned(),
            private_ip: self.private_ip(cloud).await?.map(str::to_string),
            status: self.status(cloud).await?.map(str::to_string),
        })
    }

    /// Block until both health checks pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails; the remote outcome is
    /// returned for the caller to judge.
    pub async fn wait_healthy(&self, cloud: &impl ControlPlane) -> Result<ProcessResult> {
        let op = Operation::ec2_wait("instance-status-ok", self.region())
            .arg("--instance-ids", self.id.as_str());
        cloud.execute(&op).await
    }

    /// Tear the instance down and wait until its volume and network
    /// identity are released.
    ///
    /// Already-absent resources count as success; only remote rejections
    /// are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if a step is rejected by the control plane.
    pub async fn terminate(&self, cloud: &impl ControlPlane) -> Result<()> {
        request_termination(cloud, self.region(), &self.id, &self.kind).await?;

        self.volume
            .wait_available(cloud)
            .await?
            .should_not_fail()
            .with_context(|| format!("volume {} was not released", self.volume.id))?;
        self.network
            .wait_available(cloud)
            .await?
            .should_not_fail()
            .with_context(|| format!("network interface {} was not released", self.network.id))?;
        Ok(())
    }

    /// Create a mount target for `filesystem` in the instance's subnet.
    ///
    /// # Errors
    ///
    /// Returns an error if the subnet cannot be resolved or the mount target
    /// is rejected.
    pub async fn mount(
        &self,
        cloud: &impl ControlPlane,
        ctx: &LocationContext,
        filesystem: &SharedFilesystem,
    ) -> Result<()> {
        let subnet = ctx.subnet_id(cloud).await?;
        let op = Operation::efs("create-mount-target", ctx.region())
            .arg("--file-system-id", filesystem.id.as_str())
            .arg("--subnet-id", subnet)
            .arg("--security-groups", self.network.security.id());
        cloud
            .execute(&op)
            .await?
            .should_not_fail()
            .with_context(|| format!("failed to mount {filesystem} on {self}"))?;
        Ok(())
    }
}

/// Describe one instance type; `None` when the region does not know it.
///
/// # Errors
///
/// Returns an error on any other rejection or a malformed description.
pub async fn describe_instance_type(
    cloud: &impl ControlPlane,
    region: &str,
    instance_type: &str,
) -> Result<Option<InstanceTypeDescription>> {
    let op = Operation::ec2("describe-instance-types", region)
        .arg("--instance-types", instance_type)
        .query("InstanceTypes[0]")
        .output(OutputFormat::Json);

    let raw = match cloud.execute(&op).await? {
        ProcessResult::Failed(err) if err.code == "InvalidInstanceType" => return Ok(None),
        other => other
            .optional()
            .with_context(|| format!("failed to describe instance type {instance_type}"))?,
    };
    let Some(raw) = raw else {
        return Ok(None);
    };
    let description: InstanceTypeDescription =
        serde_json::from_str(&raw).map_err(|e| SessionError::Malformed {
            operation: op.describe(),
            reason: e.to_string(),
        })?;
    Ok(Some(description))
}
