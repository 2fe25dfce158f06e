//! Loading `SessionConfig` and credentials from disk and the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::config::{Credentials, SessionConfig};

/// Environment prefix of session defaults, e.g. `EC2_REGION`.
pub const ENV_PREFIX: &str = "EC2_";
/// Environment prefix of the credentials, e.g. `AWS_ACCESS_KEY_ID`.
pub const CREDENTIALS_PREFIX: &str = "AWS_";
/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "EC2_SESSION_CONFIG";

/// Default config file: `$EC2_SESSION_CONFIG` or `~/.ec2-session/config.yaml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_path() -> Result<PathBuf> {
    if let Ok(val) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(val));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".ec2-session").join("config.yaml"))
}

/// Read the YAML config file; a missing file yields the empty layer.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<SessionConfig> {
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Variables that carry a value; empty ones count as unset.
fn non_empty<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter().filter(|(_, v)| !v.trim().is_empty())
}

/// Read the `EC2_*` layer from `vars`.
///
/// # Errors
///
/// Returns an error if a variable holds a value of the wrong type.
pub fn load_env<I>(vars: I) -> Result<SessionConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed(ENV_PREFIX)
        .from_iter(non_empty(vars))
        .context("failed to load config from EC2_* env vars")
}

/// Read the credentials from `vars`; `None` unless both keys are set.
#[must_use]
pub fn load_credentials<I>(vars: I) -> Option<Credentials>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed(CREDENTIALS_PREFIX)
        .from_iter(non_empty(vars))
        .ok()
}

/// File layer overlaid by the environment layer.
///
/// # Errors
///
/// Returns an error if either layer cannot be loaded.
pub fn load<I>(path: &Path, vars: I) -> Result<SessionConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    Ok(load_file(path)?.merge(load_env(vars)?))
}
