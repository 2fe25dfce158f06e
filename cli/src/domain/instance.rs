//! Instance variants and the shapes of instance-related control-plane output.
//!
//! Pure parsing and classification. The behavioural `Instance` (lookups,
//! termination) lives in `application::services::instance`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::SessionError;

/// Tag carrying the preemptible request id on the instance.
pub const REQUEST_ID_TAG: &str = "spot-request-id";
/// Tag carrying the provisioning strategy on the instance.
pub const REQUEST_TYPE_TAG: &str = "request-type";

/// Provisioning variant of a live instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum InstanceKind {
    /// Produced by a capped-price request that must be cancelled on teardown.
    Preemptible { request_id: String },
    /// Produced from a launch template.
    Guaranteed,
}

impl InstanceKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preemptible { .. } => "Spot",
            Self::Guaranteed => "OnDemand",
        }
    }
}

// ── Lifecycle state ───────────────────────────────────────────────────────────

/// Lifecycle state reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl LifecycleState {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// An instance in this state will never use its volume again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ShuttingDown | Self::Terminated | Self::Stopping | Self::Stopped
        )
    }
}

// ── describe-instances ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeInstances {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reservation {
    #[serde(default)]
    pub instances: Vec<InstanceDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateName {
    #[serde(rename = "Name")]
    pub name: LifecycleState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// One entry of `Reservations[].Instances[]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceDescription {
    pub instance_id: String,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub instance_lifecycle: Option<String>,
    #[serde(default)]
    pub spot_instance_request_id: Option<String>,
    pub state: StateName,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl DescribeInstances {
    /// The first described instance, if any.
    #[must_use]
    pub fn first(self) -> Option<InstanceDescription> {
        self.reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .next()
    }
}

impl InstanceDescription {
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Decide the provisioning variant of a described instance.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Malformed` when a preemptible instance carries
    /// no request id at all.
    pub fn kind(&self) -> Result<InstanceKind, SessionError> {
        if self.instance_lifecycle.as_deref() != Some("spot") {
            return Ok(InstanceKind::Guaranteed);
        }
        self.tag(REQUEST_ID_TAG)
            .or(self.spot_instance_request_id.as_deref())
            .map(|id| InstanceKind::Preemptible {
                request_id: id.to_string(),
            })
            .ok_or_else(|| SessionError::Malformed {
                operation: "ec2 describe-instances".to_string(),
                reason: format!(
                    "unable to determine {REQUEST_ID_TAG} of spot instance {}",
                    self.instance_id
                ),
            })
    }
}

// ── run-instances ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchedInstance {
    #[serde(rename = "InstanceId")]
    pub instance_id: String,
}

/// `run-instances` output.
#[derive(Debug, Clone, Deserialize)]
pub struct RunInstances {
    #[serde(rename = "Instances", default)]
    pub instances: Vec<LaunchedInstance>,
}

// ── describe-instance-status ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StatusDetail {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Status")]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Details", default)]
    pub details: Vec<StatusDetail>,
}

impl fmt::Display for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .details
            .iter()
            .map(|d| format!("{} {}", d.name, d.status))
            .collect();
        write!(f, "{} ({})", self.status, details.join(", "))
    }
}

/// `InstanceStatuses[0]` of `describe-instance-status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceHealth {
    pub instance_state: StateName,
    pub instance_status: HealthCheck,
    pub system_status: HealthCheck,
}

impl InstanceHealth {
    /// Composite one-line status: lifecycle plus both health checks.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Status: {}, instance: {}, system: {}",
            lifecycle_label(self.instance_state.name),
            self.instance_status,
            self.system_status
        )
    }
}

fn lifecycle_label(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Pending => "pending",
        LifecycleState::Running => "running",
        LifecycleState::ShuttingDown => "shutting-down",
        LifecycleState::Terminated => "terminated",
        LifecycleState::Stopping => "stopping",
        LifecycleState::Stopped => "stopped",
        LifecycleState::Unknown => "unknown",
    }
}

// ── describe-instance-types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct VcpuInfo {
    #[serde(rename = "DefaultVCpus")]
    pub default_vcpus: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryInfo {
    #[serde(rename = "SizeInMiB")]
    pub size_in_mib: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Gpu {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Count")]
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpuInfo {
    #[serde(rename = "Gpus", default)]
    pub gpus: Vec<Gpu>,
    #[serde(rename = "TotalGpuMemoryInMiB", default)]
    pub total_gpu_memory_in_mib: u64,
}

/// `InstanceTypes[0]` of `describe-instance-types`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceTypeDescription {
    pub instance_type: String,
    #[serde(rename = "VCpuInfo")]
    pub vcpu_info: VcpuInfo,
    pub memory_info: MemoryInfo,
    #[serde(default)]
    pub gpu_info: Option<GpuInfo>,
}

/// vCPU, memory and optional GPU of an instance type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub instance_type: String,
    pub vcpus: u32,
    pub memory_mib: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<Gpu>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_memory_mib: Option<u64>,
}

impl From<InstanceTypeDescription> for SystemInfo {
    fn from(desc: InstanceTypeDescription) -> Self {
        let (gpu, gpu_memory_mib) = match desc.gpu_info {
            Some(info) => (
                info.gpus.into_iter().next(),
                Some(info.total_gpu_memory_in_mib),
            ),
            None => (None, None),
        };
        Self {
            instance_type: desc.instance_type,
            vcpus: desc.vcpu_info.default_vcpus,
            memory_mib: desc.memory_info.size_in_mib,
            gpu,
            gpu_memory_mib,
        }
    }
}

impl SystemInfo {
    /// Memory in GiB, formatted with two decimals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn memory_gib(&self) -> String {
        format!("{:.2}", self.memory_mib as f64 / 1024.0)
    }

    /// Key/value lines for the hierarchical report.
    #[must_use]
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("InstanceType", self.instance_type.clone()),
            ("vCPUs", self.vcpus.to_string()),
            ("Memory", format!("{} GiB", self.memory_gib())),
        ];
        if let Some(gpu) = &self.gpu {
            lines.push(("GPUs", format!("{} x {}", gpu.count, gpu.name)));
        }
        if let Some(mem) = self.gpu_memory_mib {
            lines.push(("GPU Memory", format!("{mem} MiB")));
        }
        lines
    }
}
