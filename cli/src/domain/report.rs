//! One-shot status snapshot of a session.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::instance::{InstanceKind, SystemInfo};

/// Everything `status` knows about a session, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub session: String,
    pub region: String,
    pub availability_zone: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub volume_id: Option<String>,
    pub network_interface_id: Option<String>,
    pub instance: Option<InstanceReport>,
    pub checked_at: DateTime<Utc>,
}

/// The live instance part of a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceReport {
    pub id: String,
    #[serde(flatten)]
    pub kind: InstanceKind,
    pub system: Option<SystemInfo>,
    pub private_ip: Option<String>,
    pub status: Option<String>,
}

impl InstanceReport {
    /// `Spot(i-...)` / `OnDemand(i-...)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}({})", self.kind.label(), self.id)
    }

    /// Suggested login command.
    #[must_use]
    pub fn ssh_hint(&self) -> Option<String> {
        self.private_ip.as_ref().map(|ip| format!("ssh ubuntu@{ip}"))
    }
}
