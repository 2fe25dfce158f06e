//! Command implementations
//!
//! Every session command takes the session name plus the location overrides
//! below; flags win over `EC2_*` variables, which win over the config file.

pub mod ip;
pub mod mount;
pub mod restart;
pub mod start;
pub mod status;
pub mod stop;
pub mod types;

use anyhow::Result;
use clap::Args;

use crate::application::services::location::LocationContext;
use crate::application::services::session::Session;
use crate::domain::config::require;
use crate::domain::{
    Location, MachineImage, SecurityPolicy, SessionConfig, SessionName, Sizing, Strategy,
};

/// Session name plus location, shared by read-only and teardown commands.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Session name
    pub session: SessionName,

    #[command(flatten)]
    pub location: LocationArgs,
}

/// Where the session lives.
#[derive(Args, Debug, Clone, Default)]
pub struct LocationArgs {
    /// Region, e.g. eu-west-2
    #[arg(long)]
    pub region: Option<String>,

    /// Availability zone inside the region, e.g. eu-west-2a
    #[arg(long, short = 'z')]
    pub availability_zone: Option<String>,

    /// Network (VPC) holding the session subnet
    #[arg(long)]
    pub vpc_id: Option<String>,

    /// Security group of the session network interface
    #[arg(long)]
    pub security_group: Option<String>,
}

impl LocationArgs {
    /// Resolve the validated location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when a value is set nowhere, or
    /// `LocationError` when the zone does not belong to the region.
    pub fn location(&self, config: &SessionConfig) -> Result<Location> {
        let region = require(
            self.region.as_deref(),
            config.region.as_deref(),
            "region",
            "--region",
            "EC2_REGION",
        )?;
        let zone = require(
            self.availability_zone.as_deref(),
            config.availability_zone.as_deref(),
            "availability zone",
            "--availability-zone",
            "EC2_AVAILABILITY_ZONE",
        )?;
        let vpc = require(
            self.vpc_id.as_deref(),
            config.vpc_id.as_deref(),
            "VPC id",
            "--vpc-id",
            "EC2_VPC_ID",
        )?;
        Ok(Location::new(&region, &zone, &vpc)?)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when no security group is configured.
    pub fn security(&self, config: &SessionConfig) -> Result<SecurityPolicy> {
        let group = require(
            self.security_group.as_deref(),
            config.security_group.as_deref(),
            "security group",
            "--security-group",
            "EC2_SECURITY_GROUP",
        )?;
        Ok(SecurityPolicy::new(group))
    }

    /// The session addressed by `name` at this location.
    ///
    /// # Errors
    ///
    /// Returns an error if the location or security group cannot be resolved.
    pub fn session(&self, config: &SessionConfig, name: &SessionName) -> Result<Session> {
        Ok(Session::new(
            name.clone(),
            LocationContext::new(self.location(config)?),
            self.security(config)?,
        ))
    }
}

/// How the session instance is launched.
#[derive(Args, Debug, Clone, Default)]
pub struct LaunchArgs {
    /// spot or ondemand
    #[arg(long)]
    pub request_type: Option<Strategy>,

    /// Name tag of the instance (defaults to the session name)
    #[arg(long)]
    pub instance_name: Option<String>,

    /// Instance type, e.g. r5.large
    #[arg(long, short = 't')]
    pub instance_type: Option<String>,

    /// Machine image id
    #[arg(long)]
    pub ami_id: Option<String>,

    /// Key pair name
    #[arg(long)]
    pub public_key: Option<String>,

    /// Instance profile, by name or ARN
    #[arg(long)]
    pub role: Option<String>,

    /// Size of the session volume in GiB, used when it is first created
    #[arg(long)]
    pub volume_size: Option<u32>,

    /// Root disk size of the instance in GiB
    #[arg(long)]
    pub instance_volume_size: Option<u32>,

    /// Maximum hourly price of a spot request
    #[arg(long)]
    pub bid_price: Option<String>,
}

impl LaunchArgs {
    #[must_use]
    pub fn strategy(&self, config: &SessionConfig) -> Strategy {
        self.request_type.unwrap_or_else(|| config.request_type())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when the image, role or key pair is
    /// configured nowhere.
    pub fn image(&self, config: &SessionConfig) -> Result<MachineImage> {
        Ok(MachineImage {
            ami_id: require(
                self.ami_id.as_deref(),
                config.ami_id.as_deref(),
                "machine image",
                "--ami-id",
                "EC2_AMI_ID",
            )?,
            instance_role: require(
                self.role.as_deref(),
                config.role.as_deref(),
                "instance role",
                "--role",
                "EC2_ROLE",
            )?,
            public_key: require(
                self.public_key.as_deref(),
                config.public_key.as_deref(),
                "key pair",
                "--public-key",
                "EC2_PUBLIC_KEY",
            )?,
        })
    }

    #[must_use]
    pub fn sizing(&self, config: &SessionConfig) -> Sizing {
        Sizing {
            instance_type: self
                .instance_type
                .clone()
                .unwrap_or_else(|| config.instance_type().to_string()),
            volume_size: self.volume_size.unwrap_or_else(|| config.volume_size()),
            instance_volume_size: self
                .instance_volume_size
                .unwrap_or_else(|| config.instance_volume_size()),
            bid_price: self
                .bid_price
                .clone()
                .unwrap_or_else(|| config.bid_price().to_string()),
        }
    }
}
