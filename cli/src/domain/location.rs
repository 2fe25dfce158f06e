//! Region / availability zone / network triple and the security policy.
//!
//! Pure validation only. Subnet resolution needs the control plane and lives
//! in `application::services::location`.

use std::fmt;

use serde::Serialize;

use crate::domain::error::LocationError;

/// Where a session lives. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    region: String,
    zone: String,
    network_id: String,
}

impl Location {
    /// Build a location, checking that `zone` belongs to `region`.
    ///
    /// Zones are named after their region plus a single lowercase letter,
    /// e.g. `eu-west-2a` in `eu-west-2`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field is empty or the zone is outside the region.
    pub fn new(region: &str, zone: &str, network_id: &str) -> Result<Self, LocationError> {
        for (field, value) in [("region", region), ("zone", zone), ("network", network_id)] {
            if value.trim().is_empty() {
                return Err(LocationError::Empty { field });
            }
        }

        // `eu-west-2a`, or a local/wavelength zone such as `us-west-2-lax-1a`
        let suffix_ok = zone.strip_prefix(region).is_some_and(|s| {
            s.starts_with(|c: char| c.is_ascii_lowercase())
                || s.strip_prefix('-').is_some_and(|rest| !rest.is_empty())
        });
        if !suffix_ok {
            return Err(LocationError::ZoneOutsideRegion {
                zone: zone.to_string(),
                region: region.to_string(),
            });
        }

        Ok(Self {
            region: region.to_string(),
            zone: zone.to_string(),
            network_id: network_id.to_string(),
        })
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    #[must_use]
    pub fn network_id(&self) -> &str {
        &self.network_id
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.zone, self.region, self.network_id)
    }
}

/// Firewall rule-set attached to network identities and mount targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityPolicy(String);

impl SecurityPolicy {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
