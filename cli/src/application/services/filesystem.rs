//! Shared filesystem addressed by its creation token.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{ControlPlane, ProgressReporter, Prompt};
use crate::application::services::location::LocationContext;
use crate::domain::Operation;
use crate::domain::error::SessionError;
use crate::domain::filesystem::{DescribeFileSystems, FileSystemDescription, LIFECYCLE_POLICY};
use crate::domain::operation::{OutputFormat, tag};

/// Interval between lifecycle polls while a filesystem is being created.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A shared filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedFilesystem {
    pub id: String,
    pub name: String,
    pub region: String,
}

impl std::fmt::Display for SharedFilesystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.name)
    }
}

async fn describe(
    cloud: &impl ControlPlane,
    region: &str,
    name: &str,
) -> Result<Option<FileSystemDescription>> {
    let op = Operation::efs("describe-file-systems", region)
        .arg("--creation-token", name)
        .output(OutputFormat::Json);

    let listing = cloud
        .execute(&op)
        .await?
        .optional()
        .context("failed to look up filesystem")?;
    let Some(raw) = listing else {
        return Ok(None);
    };
    let listing: DescribeFileSystems = serde_json::from_str(&raw).map_err(|e| {
        SessionError::Malformed {
            operation: op.describe(),
            reason: e.to_string(),
        }
    })?;
    Ok(listing.first())
}

/// Look up the filesystem created with token `name`.
///
/// # Errors
///
/// Returns an error if the lookup is rejected or its output is malformed.
pub async fn get(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
) -> Result<Option<SharedFilesystem>> {
    Ok(describe(cloud, ctx.region(), name)
        .await?
        .map(|fs| SharedFilesystem {
            id: fs.file_system_id,
            name: name.to_string(),
            region: ctx.region().to_string(),
        }))
}

/// Create an encrypted filesystem, wait for it, then apply the lifecycle
/// policy once.
///
/// # Errors
///
/// Returns an error if creation is rejected, the filesystem disappears while
/// polling, or the lifecycle policy is rejected.
pub async fn create(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
) -> Result<SharedFilesystem> {
    create_polling(cloud, ctx, name, POLL_INTERVAL).await
}

/// [`create`] with an explicit poll interval.
///
/// # Errors
///
/// See [`create`].
pub async fn create_polling(
    cloud: &impl ControlPlane,
    ctx: &LocationContext,
    name: &str,
    interval: Duration,
) -> Result<SharedFilesystem> {
    let op = Operation::efs("create-file-system", ctx.region())
        .switch("--encrypted")
        .arg("--creation-token", name)
        .arg("--tags", tag("Name", name))
        .output(OutputFormat::Json);

    let created: FileSystemDescription = cloud
        .execute(&op)
        .await?
        .json()
        .context("failed to create filesystem")?;
    let id = created.file_system_id;
    tracing::info!(filesystem = %id, name, "filesystem created, waiting until available");

    loop {
        let current = describe(cloud, ctx.region(), name)
            .await?
            .ok_or_else(|| SessionError::Malformed {
                operation: "efs describe-file-systems".to_string(),
                reason: format!("filesystem {name} vanished while being created"),
            })?;
        if !current.is_creating() {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    let lifecycle = Operation::efs("put-lifecycle-configuration", ctx.region())
        .arg("--file-system-id", id.as_str())
        .arg("--lifecycle-policies", LIFECYCLE_POLICY);
    cloud
        .execute(&lifecycle)
        .await?
        .should_not_fail()
        .context("failed to configure filesystem lifecycle")?;

    Ok(SharedFilesystem {
        id,
        name: name.to_string(),
        region: ctx.region().to_string(),
    })
}

/// Result of [`get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    Existing(SharedFilesystem),
    Created(SharedFilesystem),
    /// The operator refused the creation; nothing was created.
    Declined,
}

/// Return the existing filesystem, or create it once the operator agrees.
///
/// # Errors
///
/// Returns an error if the lookup, the confirmation or the creation fails.
pub async fn get_or_create(
    cloud: &impl ControlPlane,
    prompt: &impl Prompt,
    reporter: &impl ProgressReporter,
    ctx: &LocationContext,
    name: &str,
) -> Result<Acquired> {
    if let Some(fs) = get(cloud, ctx, name).await? {
        return Ok(Acquired::Existing(fs));
    }
    let question = format!("Filesystem {name} not found in {}. Create one?", ctx.location());
    if !prompt.confirm(&question, true)? {
        return Ok(Acquired::Declined);
    }
    reporter.step(&format!("creating filesystem {name}..."));
    Ok(Acquired::Created(create(cloud, ctx, name).await?))
}
