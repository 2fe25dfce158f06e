//! Application service: session lifecycle orchestration.
//!
//! Imports only from `crate::domain` and `crate::application`. Every
//! operation is idempotent for a given session name: all state lives in the
//! remote resources tagged with that name.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::application::ports::{ControlPlane, ProgressReporter, Prompt, TemplateRenderer};
use crate::application::services::filesystem::{self, Acquired};
use crate::application::services::instance::{self, Instance};
use crate::application::services::location::LocationContext;
use crate::application::services::network::{self, NetworkIdentity};
use crate::application::services::provision::{self, LaunchRequest};
use crate::application::services::volume::{self, Volume};
use crate::domain::error::SessionError;
use crate::domain::launch::{BootPayload, BootTemplate};
use crate::domain::report::{InstanceReport, StatusReport};
use crate::domain::{Credentials, MachineImage, SecurityPolicy, SessionName, Sizing, Strategy};

/// The resources addressed by one session name.
#[derive(Debug)]
pub struct Session {
    pub name: SessionName,
    pub location: LocationContext,
    pub security: SecurityPolicy,
}

impl Session {
    #[must_use]
    pub fn new(name: SessionName, location: LocationContext, security: SecurityPolicy) -> Self {
        Self {
            name,
            location,
            security,
        }
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }

    async fn network(&self, cloud: &impl ControlPlane) -> Result<NetworkIdentity> {
        network::get_or_create(cloud, &self.location, self.name(), &self.security).await
    }

    async fn volume(&self, cloud: &impl ControlPlane) -> Result<Option<Volume>> {
        volume::get(cloud, &self.location, self.name()).await
    }
}

/// Inputs of `start` and `restart`.
#[derive(Debug, Clone, Copy)]
pub struct StartRequest<'a> {
    pub strategy: Strategy,
    /// `Name` tag of the instance; defaults to the session name.
    pub instance_name: Option<&'a str>,
    pub image: &'a MachineImage,
    pub sizing: &'a Sizing,
    /// Injected into the boot script when present.
    pub credentials: Option<&'a Credentials>,
}

/// Outcome of [`start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StartOutcome {
    /// A live instance already uses the session volume.
    AlreadyRunning { instance_id: String },
    /// A new instance was provisioned.
    Started {
        instance_id: String,
        volume_id: String,
        /// The session volume was created by this call.
        bootstrapped_volume: bool,
        /// Snapshot taken once the instance is healthy.
        status: Box<StatusReport>,
    },
}

/// Outcome of [`stop`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// No session volume exists; nothing was touched.
    VolumeNotFound,
    /// The volume exists but no live instance uses it.
    NoInstance { volume_id: String },
    /// The live instance was terminated.
    Terminated {
        instance_id: String,
        volume_id: String,
    },
}

/// Outcome of [`mount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MountOutcome {
    /// The operator declined creating the filesystem.
    Declined,
    /// No live instance to mount onto.
    NoInstance { filesystem_id: String, created: bool },
    Mounted {
        filesystem_id: String,
        instance_id: String,
        created: bool,
    },
}

// ── status ───────────────────────────────────────────────────────────────────

/// Read-only snapshot of the session. Never creates anything.
///
/// # Errors
///
/// Returns an error if any lookup fails.
pub async fn status(cloud: &impl ControlPlane, session: &Session) -> Result<StatusReport> {
    let ctx = &session.location;
    let volume = session.volume(cloud).await?;
    let network = network::get(cloud, ctx, session.name(), &session.security).await?;

    let instance = match (&volume, &network) {
        (Some(volume), Some(network)) => instance::lookup(cloud, ctx, network, volume).await?,
        _ => None,
    };
    let instance = match instance {
        Some(instance) => Some(instance.report(cloud).await?),
        None => None,
    };

    session_report(
        cloud,
        session,
        volume.map(|v| v.id),
        network.map(|n| n.id),
        instance,
    )
    .await
}

async fn session_report(
    cloud: &impl ControlPlane,
    session: &Session,
    volume_id: Option<String>,
    network_interface_id: Option<String>,
    instance: Option<InstanceReport>,
) -> Result<StatusReport> {
    let ctx = &session.location;
    let subnet_id = ctx.subnet_id(cloud).await?.to_string();
    Ok(StatusReport {
        session: session.name().to_string(),
        region: ctx.region().to_string(),
        availability_zone: ctx.zone().to_string(),
        vpc_id: ctx.location().network_id().to_string(),
        subnet_id,
        volume_id,
        network_interface_id,
        instance,
        checked_at: Utc::now(),
    })
}

// ── start ────────────────────────────────────────────────────────────────────

fn session_payload(
    templates: &impl TemplateRenderer,
    volume: &Volume,
    credentials: Option<&Credentials>,
) -> Result<BootPayload> {
    let payload = match credentials {
        Some(creds) => {
            let region = creds.region.as_deref().unwrap_or(volume.region.as_str());
            templates.render(
                BootTemplate::Chainload,
                &[
                    ("VOLUME_ID", volume.id.as_str()),
                    ("AWS_ACCESS_KEY_ID", creds.access_key_id.as_str()),
                    ("AWS_SECRET_ACCESS_KEY", creds.secret_access_key.as_str()),
                    ("AWS_REGION", region),
                ],
            )
        }
        None => templates.render(BootTemplate::Remount, &[("VOLUME_ID", volume.id.as_str())]),
    };
    payload.context("failed to render session boot script")
}

/// Start the session, bootstrapping its volume on first use.
///
/// # Errors
///
/// Returns `SessionError::CreationDeclined` if the operator refuses to create
/// a missing volume, or an error if any provisioning or wait step fails.
pub async fn start(
    cloud: &impl ControlPlane,
    templates: &impl TemplateRenderer,
    prompt: &impl Prompt,
    reporter: &impl ProgressReporter,
    session: &Session,
    req: &StartRequest<'_>,
) -> Result<StartOutcome> {
    let ctx = &session.location;
    let instance_name = req.instance_name.unwrap_or(session.name());

    reporter.step("resolving network interface...");
    let network = session.network(cloud).await?;

    let (volume, bootstrapped_volume) = match session.volume(cloud).await? {
        Some(volume) => {
            if volume.force_detach_if_stale(cloud).await? {
                reporter.warn(&format!("detached stale attachment of volume {volume}"));
            }
            if let Some(running) = instance::lookup(cloud, ctx, &network, &volume).await? {
                return Ok(StartOutcome::AlreadyRunning {
                    instance_id: running.id().to_string(),
                });
            }
            (volume, false)
        }
        None => {
            let question = format!(
                "Create volume {} ({}Gb)?",
                session.name(),
                req.sizing.volume_size
            );
            if !prompt.confirm(&question, true)? {
                return Err(SessionError::CreationDeclined.into());
            }
            let volume = provision::bootstrap_volume(
                cloud,
                templates,
                reporter,
                ctx,
                &network,
                session.name(),
                instance_name,
                req.image,
                req.sizing,
            )
            .await
            .context("failed to create session volume")?;
            (volume, true)
        }
    };

    let user_data = session_payload(templates, &volume, req.credentials)?;
    let launch = LaunchRequest {
        name: instance_name,
        image: req.image,
        instance_type: &req.sizing.instance_type,
        root_volume_size: req.sizing.instance_volume_size,
        bid_price: &req.sizing.bid_price,
        user_data: &user_data,
    };

    reporter.step(&format!("requesting {} instance...", req.strategy));
    let launched = provision::request(cloud, ctx, &network, req.strategy, &launch).await?;
    let instance = Instance::bind(launched.instance_id, launched.kind, network, volume);

    reporter.step(&format!("waiting for {instance} to be healthy..."));
    instance
        .wait_healthy(cloud)
        .await?
        .should_not_fail()
        .with_context(|| format!("{instance} did not become healthy"))?;
    instance
        .volume()
        .wait_in_use(cloud)
        .await?
        .should_not_fail()
        .with_context(|| format!("volume {} was not attached", instance.volume()))?;

    reporter.success(&format!("{instance} is running"));
    let report = session_report(
        cloud,
        session,
        Some(instance.volume().id.clone()),
        Some(instance.network().id.clone()),
        Some(instance.report(cloud).await?),
    )
    .await?;
    Ok(StartOutcome::Started {
        instance_id: instance.id().to_string(),
        volume_id: instance.volume().id.clone(),
        bootstrapped_volume,
        status: Box::new(report),
    })
}

// ── stop ─────────────────────────────────────────────────────────────────────

/// Terminate the live instance of the session, keeping volume and network.
///
/// # Errors
///
/// Returns an error if a lookup or the termination fails.
pub async fn stop(
    cloud: &impl ControlPlane,
    reporter: &impl ProgressReporter,
    session: &Session,
) -> Result<StopOutcome> {
    let Some(volume) = session.volume(cloud).await? else {
        return Ok(StopOutcome::VolumeNotFound);
    };
    let network = session.network(cloud).await?;

    let Some(instance) = instance::lookup(cloud, &session.location, &network, &volume).await?
    else {
        return Ok(StopOutcome::NoInstance {
            volume_id: volume.id,
        });
    };

    reporter.step(&format!("waiting for {instance} to be stable..."));
    let settled = instance.wait_healthy(cloud).await?;
    if let Err(e) = settled.should_not_fail() {
        tracing::warn!(instance = %instance, error = %e, "instance never became healthy, terminating anyway");
    }

    reporter.step(&format!("shutting down {instance}..."));
    instance.terminate(cloud).await?;
    reporter.success(&format!("{instance} terminated"));

    Ok(StopOutcome::Terminated {
        instance_id: instance.id().to_string(),
        volume_id: volume.id,
    })
}

// ── restart ──────────────────────────────────────────────────────────────────

/// Replace the compute of an existing session, keeping its volume.
///
/// # Errors
///
/// Returns `SessionError::VolumeNotFound` if the session has no volume, or
/// any error of [`stop`] and [`start`].
pub async fn restart(
    cloud: &impl ControlPlane,
    templates: &impl TemplateRenderer,
    prompt: &impl Prompt,
    reporter: &impl ProgressReporter,
    session: &Session,
    req: &StartRequest<'_>,
) -> Result<(StopOutcome, StartOutcome)> {
    let stopped = stop(cloud, reporter, session).await?;
    if stopped == StopOutcome::VolumeNotFound {
        return Err(SessionError::VolumeNotFound(session.name().to_string()).into());
    }
    let started = start(cloud, templates, prompt, reporter, session, req).await?;
    Ok((stopped, started))
}

// ── ip ───────────────────────────────────────────────────────────────────────

/// Private address of the live instance, if any. Never creates anything.
///
/// # Errors
///
/// Returns an error if a lookup fails.
pub async fn ip(cloud: &impl ControlPlane, session: &Session) -> Result<Option<String>> {
    let Some(volume) = session.volume(cloud).await? else {
        return Ok(None);
    };
    let Some(network) =
        network::get(cloud, &session.location, session.name(), &session.security).await?
    else {
        return Ok(None);
    };
    match instance::lookup(cloud, &session.location, &network, &volume).await? {
        Some(instance) => Ok(instance.private_ip(cloud).await?.map(str::to_string)),
        None => Ok(None),
    }
}

// ── mount ────────────────────────────────────────────────────────────────────

/// Get or create the shared filesystem and mount it onto the live instance.
///
/// # Errors
///
/// Returns an error if a lookup, the creation or the mount fails.
pub async fn mount(
    cloud: &impl ControlPlane,
    prompt: &impl Prompt,
    reporter: &impl ProgressReporter,
    session: &Session,
    filesystem_name: &str,
) -> Result<MountOutcome> {
    let ctx = &session.location;
    let (fs, created) =
        match filesystem::get_or_create(cloud, prompt, reporter, ctx, filesystem_name).await? {
            Acquired::Existing(fs) => (fs, false),
            Acquired::Created(fs) => (fs, true),
            Acquired::Declined => return Ok(MountOutcome::Declined),
        };

    let Some(volume) = session.volume(cloud).await? else {
        return Ok(MountOutcome::NoInstance {
            filesystem_id: fs.id,
            created,
        });
    };
    let network = session.network(cloud).await?;
    let Some(instance) = instance::lookup(cloud, ctx, &network, &volume).await? else {
        return Ok(MountOutcome::NoInstance {
            filesystem_id: fs.id,
            created,
        });
    };

    instance.mount(cloud, ctx, &fs).await?;
    reporter.success(&format!("{fs} mounted on {instance}"));
    Ok(MountOutcome::Mounted {
        filesystem_id: fs.id,
        instance_id: instance.id().to_string(),
        created,
    })
}
