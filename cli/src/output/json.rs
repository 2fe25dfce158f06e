//! JSON output for `--json`.
//!
//! Every renderer prints one pretty-printed document on stdout. Failures are
//! reported with [`format_error`].

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::application::services::session::{MountOutcome, StartOutcome, StopOutcome};
use crate::domain::instance::SystemInfo;
use crate::domain::{CommandError, ConfigError, LocationError, RemoteError, SessionError};
use crate::domain::report::StatusReport;

/// Renders session results as JSON documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

fn print<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{out}");
    Ok(())
}

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_status(self, report: &StatusReport) -> Result<()> {
        print(report)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_system_info(self, system: &SystemInfo) -> Result<()> {
        print(system)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_offerings(self, zone: &str, types: &[String]) -> Result<()> {
        print(&json!({ "availability_zone": zone, "instance_types": types }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_start(self, session: &str, outcome: &StartOutcome) -> Result<()> {
        print(&json!({ "session": session, "start": outcome }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_stop(self, session: &str, outcome: &StopOutcome) -> Result<()> {
        print(&json!({ "session": session, "stop": outcome }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_ip(self, ip: Option<&str>) -> Result<()> {
        print(&json!({ "private_ip": ip }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_mount(self, filesystem: &str, outcome: &MountOutcome) -> Result<()> {
        print(&json!({ "filesystem": filesystem, "mount": outcome }))
    }
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable code of a failure: the remote error code when the
/// control plane refused a request, otherwise the error family.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(remote) = cause.downcast_ref::<RemoteError>() {
            return remote.code.clone();
        }
        if let Some(CommandError::Remote(remote)) = cause.downcast_ref::<CommandError>() {
            return remote.code.clone();
        }
        if cause.is::<SessionError>() {
            return "SessionError".to_string();
        }
        if cause.is::<ConfigError>() {
            return "ConfigError".to_string();
        }
        if cause.is::<LocationError>() {
            return "LocationError".to_string();
        }
    }
    "Error".to_string()
}
