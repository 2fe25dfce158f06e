//! Instance provisioning and the bootstrap/promote protocol.
//!
//! A session volume is born as the root disk of a temporary preemptible
//! instance. [`bootstrap_volume`] launches that instance, promotes its root
//! disk to a standalone tagged volume, and always terminates the temporary
//! instance afterwards.

use anyhow::{Context, Result};

use crate::application::ports::{ControlPlane, ProgressReporter, TemplateRenderer};
use crate::application::services::instance::{self, Instance};
use crate::application::services::location::LocationContext;
use crate::application::services::network::NetworkIdentity;
use crate::application::services::volume::Volume;
use crate::domain::error::SessionError;
use crate::domain::instance::{InstanceKind, REQUEST_ID_TAG, REQUEST_TYPE_TAG, RunInstances};
use crate::domain::launch::{BootPayload, BootTemplate, LaunchSpec, keep_root_volume_mapping};
use crate::domain::operation::{OutputFormat, tag};
use crate::domain::process::first_token;
use crate::domain::{MachineImage, Operation, Sizing, Strategy};

/// Everything needed to launch one instance.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// `Name` tag of the instance and name of its launch template.
    pub name: &'a str,
    pub image: &'a MachineImage,
    pub instance_type: &'a str,
    /// Root disk size in GiB.
    pub root_volume_size: u32,
    /// Price cap for preemptible requests.
    pub bid_price: &'a str,
    pub user_data: &'a BootPayload,
}

/// A freshly launched instance, not yet bound to a session volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    pub instance_id: String,
    pub kind: InstanceKind,
}

fn launch_document(
    ctx: &LocationContext,
    network: &NetworkIdentity,
    req: &LaunchRequest<'_>,
) -> String {
    LaunchSpec {
        ami_id: &req.image.ami_id,
        instance_type: req.instance_type,
        key_name: &req.image.public_key,
        zone: ctx.zone(),
        instance_role: &req.image.instance_role,
        root_volume_size: req.root_volume_size,
        network_interface_id: &network.id,
        user_data: req.user_data,
    }
    .document()
    .to_string()
}

// ── Preemptible ──────────────────────────────────────────────────────────────

/// Submit a capped-price request and wait for its instance to run.
///
/// # Errors
///
/// Returns an error if the request is rejected, never fulfilled, or its
/// instance never reaches the running state.
pub async fn request_preemptible(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    network: &NetworkIdentity,
    req: &LaunchRequest<'_>,
) -> Result<Launched> {
    let region = ctx.region();
    let op = Operation::ec2("request-spot-instances", region)
        .arg("--launch-specification", launch_document(ctx, network, req))
        .arg("--spot-price", req.bid_price)
        .query("SpotInstanceRequests[0].SpotInstanceRequestId")
        .output(OutputFormat::Text);
    let request_id = cloud
        .execute(&op)
        .await?
        .result()
        .context("failed to request spot instance")?;
    tracing::info!(request = %request_id, "spot request submitted, waiting for fulfilment");

    let fulfilled = Operation::ec2_wait("spot-instance-request-fulfilled", region)
        .arg("--spot-instance-request-ids", request_id.as_str());
    cloud
        .execute(&fulfilled)
        .await?
        .should_not_fail()
        .with_context(|| format!("spot request {request_id} was not fulfilled"))?;

    let describe = Operation::ec2("describe-spot-instance-requests", region)
        .arg("--spot-instance-request-ids", request_id.as_str())
        .query("SpotInstanceRequests[0].InstanceId")
        .output(OutputFormat::Text);
    let instance_id = cloud
        .execute(&describe)
        .await?
        .result()
        .with_context(|| format!("failed to read instance of spot request {request_id}"))?;

    let tags = Operation::ec2("create-tags", region)
        .arg_list("--resources", [request_id.as_str(), instance_id.as_str()])
        .arg_list(
            "--tags",
            [
                tag("Name", req.name),
                tag(REQUEST_ID_TAG, &request_id),
                tag(REQUEST_TYPE_TAG, Strategy::Preemptible.as_str()),
            ],
        );
    cloud
        .execute(&tags)
        .await?
        .should_not_fail()
        .context("failed to tag spot instance")?;

    tracing::info!(instance = %instance_id, "waiting for spot instance to start");
    let running = Operation::ec2_wait("instance-running", region)
        .arg("--instance-ids", instance_id.as_str());
    cloud
        .execute(&running)
        .await?
        .should_not_fail()
        .with_context(|| format!("spot instance {instance_id} did not start"))?;

    Ok(Launched {
        instance_id,
        kind: InstanceKind::Preemptible { request_id },
    })
}

// ── Guaranteed ───────────────────────────────────────────────────────────────

/// Create the launch template `name`, replacing an existing one.
async fn upsert_launch_template(
    cloud: &impl ControlPlane,
    region: &str,
    name: &str,
    document: &str,
) -> Result<()> {
    let create = Operation::ec2("create-launch-template", region)
        .arg("--launch-template-name", name)
        .arg("--version-description", "version1")
        .arg("--launch-template-data", document);

    let Err(conflict) = cloud.execute(&create).await?.should_not_fail() else {
        return Ok(());
    };
    tracing::warn!(template = name, error = %conflict, "replacing launch template");

    let delete = Operation::ec2("delete-launch-template", region)
        .arg("--launch-template-name", name);
    cloud
        .execute(&delete)
        .await?
        .should_not_fail()
        .with_context(|| format!("failed to delete launch template {name}"))?;

    cloud
        .execute(&create)
        .await?
        .should_not_fail()
        .with_context(|| format!("failed to create launch template {name}"))?;
    Ok(())
}

/// Launch an instance from a freshly upserted launch template.
///
/// # Errors
///
/// Returns an error if the template cannot be written or the launch is
/// rejected.
pub async fn request_guaranteed(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    network: &NetworkIdentity,
    req: &LaunchRequest<'_>,
) -> Result<Launched> {
    let region = ctx.region();
    upsert_launch_template(cloud, region, req.name, &launch_document(ctx, network, req)).await?;

    let run = Operation::ec2("run-instances", region)
        .arg("--placement", format!("AvailabilityZone={}", ctx.zone()))
        .arg("--launch-template", format!("LaunchTemplateName={}", req.name))
        .output(OutputFormat::Json);
    let launched: RunInstances = cloud
        .execute(&run)
        .await?
        .json()
        .context("failed to run on-demand instance")?;
    let instance_id = launched
        .instances
        .into_iter()
        .next()
        .map(|i| i.instance_id)
        .ok_or_else(|| SessionError::Malformed {
            operation: run.describe(),
            reason: "no instance in response".to_string(),
        })?;

    let tags = Operation::ec2("create-tags", region)
        .arg("--resources", instance_id.as_str())
        .arg_list(
            "--tags",
            [
                tag("Name", req.name),
                tag(REQUEST_TYPE_TAG, Strategy::Guaranteed.as_str()),
            ],
        );
    cloud
        .execute(&tags)
        .await?
        .should_not_fail()
        .context("failed to tag on-demand instance")?;

    tracing::info!(instance = %instance_id, "on-demand instance launched");
    Ok(Launched {
        instance_id,
        kind: InstanceKind::Guaranteed,
    })
}

/// Launch with the given strategy.
///
/// # Errors
///
/// See [`request_preemptible`] and [`request_guaranteed`].
pub async fn request(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    network: &NetworkIdentity,
    strategy: Strategy,
    req: &LaunchRequest<'_>,
) -> Result<Launched> {
    match strategy {
        Strategy::Preemptible => request_preemptible(cloud, ctx, network, req).await,
        Strategy::Guaranteed => request_guaranteed(cloud, ctx, network, req).await,
    }
}

// ── Bootstrap / promote ──────────────────────────────────────────────────────

/// Root disk of a launched instance.
///
/// # Errors
///
/// Returns an error if the instance has no root disk yet.
pub async fn root_volume(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    instance_id: &str,
    name: &str,
) -> Result<Volume> {
    let op = Operation::ec2("describe-instances", ctx.region())
        .arg("--instance-ids", instance_id)
        .query("Reservations[0].Instances[0].BlockDeviceMappings[0].Ebs.VolumeId")
        .output(OutputFormat::Text);
    let id = cloud
        .execute(&op)
        .await?
        .result()
        .with_context(|| format!("failed to read root volume of {instance_id}"))?;
    Ok(Volume {
        id: first_token(&id).to_string(),
        name: name.to_string(),
        region: ctx.region().to_string(),
    })
}

/// Keep the root disk of `instance` after termination and tag it as the
/// session volume `session`.
///
/// # Errors
///
/// Returns an error if the deletion policy or the tag is rejected.
pub async fn persist_volume(
    cloud: &impl ControlPlane,
    instance: &Instance,
    session: &str,
) -> Result<Volume> {
    let region = instance.volume().region.as_str();
    let keep = Operation::ec2("modify-instance-attribute", region)
        .arg("--instance-id", instance.id())
        .arg("--block-device-mappings", keep_root_volume_mapping());
    cloud
        .execute(&keep)
        .await?
        .should_not_fail()
        .context("failed to keep root volume on termination")?;

    let volume_id = instance.volume().id.clone();
    let tags = Operation::ec2("create-tags", region)
        .arg("--resources", volume_id.as_str())
        .arg("--tags", tag("Name", session));
    cloud
        .execute(&tags)
        .await?
        .should_not_fail()
        .context("failed to tag persistent volume")?;

    tracing::info!(volume = %volume_id, session, "root volume promoted");
    Ok(Volume {
        id: volume_id,
        name: session.to_string(),
        region: region.to_string(),
    })
}

/// Create the session volume from a temporary preemptible instance.
///
/// The temporary instance is terminated whether or not promotion succeeds.
/// A promotion error wins over a cleanup error; the latter is then only
/// logged.
///
/// # Errors
///
/// Returns an error if the temporary instance cannot be launched, its root
/// disk cannot be promoted, or it cannot be terminated.
#[allow(clippy::too_many_arguments)]
pub async fn bootstrap_volume(
    cloud: &impl ControlPlane,
    templates: &impl TemplateRenderer,
    reporter: &impl ProgressReporter,
    ctx: &LocationContext,
    network: &NetworkIdentity,
    session: &str,
    instance_name: &str,
    image: &MachineImage,
    sizing: &Sizing,
) -> Result<Volume> {
    let user_data = templates
        .render(BootTemplate::Reference, &[])
        .context("failed to render bootstrap boot script")?;
    let req = LaunchRequest {
        name: instance_name,
        image,
        instance_type: &sizing.instance_type,
        root_volume_size: sizing.volume_size,
        bid_price: &sizing.bid_price,
        user_data: &user_data,
    };

    reporter.step("launching temporary instance to create volume...");
    let launched = request_preemptible(cloud, ctx, network, &req).await?;
    let label = format!("{}({})", launched.kind.label(), launched.instance_id);

    reporter.step(&format!("promoting root volume of {label}..."));
    let (promoted, cleanup) =
        match root_volume(cloud, ctx, &launched.instance_id, instance_name).await {
            Ok(root) => {
                let temp =
                    Instance::bind(launched.instance_id, launched.kind, network.clone(), root);
                let promoted = persist_volume(cloud, &temp, session).await;
                reporter.step(&format!("terminating temporary instance {label}..."));
                (promoted, temp.terminate(cloud).await)
            }
            Err(e) => {
                reporter.step(&format!("terminating temporary instance {label}..."));
                (Err(e), release_unbound(cloud, ctx, network, &launched).await)
            }
        };

    match (promoted, cleanup) {
        (Ok(volume), Ok(())) => {
            reporter.success(&format!("volume {volume} created"));
            Ok(volume)
        }
        (Ok(_), Err(e)) => Err(e.context(format!("failed to clean up temporary instance {label}"))),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            tracing::error!(instance = %label, error = %cleanup_err, "temporary instance cleanup failed");
            reporter.warn(&format!("temporary instance {label} may still be running"));
            Err(e)
        }
    }
}

/// Tear down a launched instance whose root disk is unknown.
async fn release_unbound(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    network: &NetworkIdentity,
    launched: &Launched,
) -> Result<()> {
    instance::request_termination(cloud, ctx.region(), &launched.instance_id, &launched.kind)
        .await?;
    network
        .wait_available(cloud)
        .await?
        .should_not_fail()
        .with_context(|| format!("network interface {} was not released", network.id))?;
    Ok(())
}
