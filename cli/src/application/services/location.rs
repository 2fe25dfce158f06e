//! Location context with its memoized subnet.

use std::sync::OnceLock;

use anyhow::{Context, Result};

use crate::application::ports::ControlPlane;
use crate::domain::error::LocationError;
use crate::domain::operation::{OutputFormat, network_filter, zone_filter};
use crate::domain::{Location, Operation};

/// A validated location plus lazily resolved derived identifiers.
#[derive(Debug)]
pub struct LocationContext {
    location: Location,
    subnet: OnceLock<String>,
}

impl LocationContext {
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            location,
            subnet: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn region(&self) -> &str {
        self.location.region()
    }

    #[must_use]
    pub fn zone(&self) -> &str {
        self.location.zone()
    }

    /// Subnet of the network in this zone, looked up once.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::NoSubnet` when the network has no subnet in
    /// the zone, or the remote error of a rejected lookup.
    pub async fn subnet_id(&self, cloud: &impl ControlPlane) -> Result<&str> {
        if let Some(id) = self.subnet.get() {
            return Ok(id);
        }

        let op = Operation::ec2("describe-subnets", self.region())
            .arg_list(
                "--filters",
                [
                    zone_filter(self.zone()),
                    network_filter(self.location.network_id()),
                ],
            )
            .query("Subnets[0].SubnetId")
            .output(OutputFormat::Text);

        let id = cloud
            .execute(&op)
            .await?
            .optional()
            .context("failed to look up subnet")?
            .ok_or_else(|| LocationError::NoSubnet {
                zone: self.zone().to_string(),
                network: self.location.network_id().to_string(),
            })?;

        tracing::debug!(subnet = %id, location = %self.location, "resolved subnet");
        Ok(self.subnet.get_or_init(|| id))
    }
}
