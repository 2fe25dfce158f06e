//! Configuration schema and resolution.
//!
//! Pure functions only: no I/O, no async, no filesystem access. Loading from
//! the environment and from disk happens in `infra::config`.

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::session::Strategy;

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_INSTANCE_TYPE: &str = "r5.large";
pub const DEFAULT_VOLUME_SIZE: u32 = 512;
pub const DEFAULT_INSTANCE_VOLUME_SIZE: u32 = 30;
pub const DEFAULT_BID_PRICE: &str = "1";

// ── Config schema ────────────────────────────────────────────────────────────

/// Session defaults, one layer of configuration.
///
/// Every field is optional so that the file layer and the `EC2_*` environment
/// layer can be merged before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub region: Option<String>,
    pub availability_zone: Option<String>,
    pub vpc_id: Option<String>,
    pub security_group: Option<String>,
    pub ami_id: Option<String>,
    pub role: Option<String>,
    pub public_key: Option<String>,
    pub instance_type: Option<String>,
    pub volume_size: Option<u32>,
    pub instance_volume_size: Option<u32>,
    pub spot_bid_price: Option<String>,
    pub request_type: Option<Strategy>,
}

impl SessionConfig {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            region: other.region.or(self.region),
            availability_zone: other.availability_zone.or(self.availability_zone),
            vpc_id: other.vpc_id.or(self.vpc_id),
            security_group: other.security_group.or(self.security_group),
            ami_id: other.ami_id.or(self.ami_id),
            role: other.role.or(self.role),
            public_key: other.public_key.or(self.public_key),
            instance_type: other.instance_type.or(self.instance_type),
            volume_size: other.volume_size.or(self.volume_size),
            instance_volume_size: other.instance_volume_size.or(self.instance_volume_size),
            spot_bid_price: other.spot_bid_price.or(self.spot_bid_price),
            request_type: other.request_type.or(self.request_type),
        }
    }

    #[must_use]
    pub fn instance_type(&self) -> &str {
        self.instance_type.as_deref().unwrap_or(DEFAULT_INSTANCE_TYPE)
    }

    #[must_use]
    pub fn volume_size(&self) -> u32 {
        self.volume_size.unwrap_or(DEFAULT_VOLUME_SIZE)
    }

    #[must_use]
    pub fn instance_volume_size(&self) -> u32 {
        self.instance_volume_size
            .unwrap_or(DEFAULT_INSTANCE_VOLUME_SIZE)
    }

    #[must_use]
    pub fn bid_price(&self) -> &str {
        self.spot_bid_price.as_deref().unwrap_or(DEFAULT_BID_PRICE)
    }

    #[must_use]
    pub fn request_type(&self) -> Strategy {
        self.request_type.unwrap_or_default()
    }
}

/// Short-lived credentials injected into the chainload boot script.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Pick an override, then a configured value, or fail naming both sources.
///
/// # Errors
///
/// Returns `ConfigError::Missing` when neither is set.
pub fn require(
    flag_value: Option<&str>,
    configured: Option<&str>,
    what: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    flag_value
        .or(configured)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing { what, flag, env })
}

// ── Unit tests ───────────────────────────────────────────────────────────────
