//! Session identity, provisioning strategy and sizing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::SessionError;

/// Human-chosen name that keys every remote resource of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionName(String);

impl SessionName {
    /// Validate and wrap a session name.
    ///
    /// The name ends up in tags, launch template names and filters, so it is
    /// limited to `^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidName` for anything else.
    pub fn parse(name: &str) -> Result<Self, SessionError> {
        let mut chars = name.chars();
        let valid = name.len() <= 128
            && chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(SessionError::InvalidName(name.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionName {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How compute capacity is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Spare capacity at a capped price; revocable.
    #[default]
    #[serde(rename = "spot")]
    Preemptible,
    /// Dedicated capacity through a launch template.
    #[serde(rename = "ondemand")]
    Guaranteed,
}

impl Strategy {
    /// Value of the `request-type` tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preemptible => "spot",
            Self::Guaranteed => "ondemand",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spot" | "preemptible" => Ok(Self::Preemptible),
            "ondemand" | "on-demand" | "guaranteed" => Ok(Self::Guaranteed),
            _ => Err(SessionError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Machine image, role and key pair used for every instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineImage {
    pub ami_id: String,
    pub instance_role: String,
    pub public_key: String,
}

/// Compute and storage sizing for one `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sizing {
    pub instance_type: String,
    /// Size of the persistent session volume in GiB (bootstrap only).
    pub volume_size: u32,
    /// Root disk size of the session instance in GiB.
    pub instance_volume_size: u32,
    /// Maximum hourly price for preemptible requests.
    pub bid_price: String,
}
