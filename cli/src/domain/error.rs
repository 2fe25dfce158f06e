//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

// ── Remote failures ───────────────────────────────────────────────────────────

/// Matches the diagnostic line the `aws` CLI prints on a rejected call, e.g.
/// `An error occurred (InvalidVolume.NotFound) when calling the DescribeVolumes operation: ...`.
static DIAGNOSTIC: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"An error occurred \((?P<code>[^)]+)\)(?: \(reached max retries: \d+\))? when calling the (?P<operation>\w+) operation(?: \([^)]*\))?: (?P<detail>(?s:.+))",
    )
    .ok()
});

/// Code used when the diagnostic text does not follow the known pattern.
pub const UNKNOWN_CODE: &str = "Unknown";

/// A control-plane call that the remote side rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed ({code}): {detail}")]
pub struct RemoteError {
    /// Provider error code, e.g. `InvalidParameterValue`.
    pub code: String,
    /// Provider operation name, e.g. `DescribeVolumes`.
    pub operation: String,
    /// Human-readable message. Never empty.
    pub detail: String,
}

impl RemoteError {
    /// Parse the diagnostic text of a failed call.
    ///
    /// Falls back to the raw text when the pattern is not recognized, so no
    /// information is lost. `fallback_operation` names the operation in that
    /// case and `exit_code` is mentioned when there is no text at all.
    #[must_use]
    pub fn parse(stderr: &str, fallback_operation: &str, exit_code: Option<i32>) -> Self {
        let text = stderr.trim();
        if let Some(caps) = DIAGNOSTIC.as_ref().and_then(|re| re.captures(text))
            && !caps["detail"].trim().is_empty()
        {
            return Self {
                code: caps["code"].to_string(),
                operation: caps["operation"].to_string(),
                detail: caps["detail"].trim().to_string(),
            };
        }

        let detail = if text.is_empty() {
            match exit_code {
                Some(code) => format!("exit status {code} with no diagnostic output"),
                None => "terminated by signal with no diagnostic output".to_string(),
            }
        } else {
            text.to_string()
        };
        Self {
            code: UNKNOWN_CODE.to_string(),
            operation: fallback_operation.to_string(),
            detail,
        }
    }

    /// Whether the provider reported the addressed resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code.ends_with("NotFound")
    }
}

// ── Command results ───────────────────────────────────────────────────────────

/// Errors raised when a command result is consumed strictly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid output received from command {operation}: {raw:?}")]
    EmptyOutput { operation: String, raw: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

// ── Location errors ───────────────────────────────────────────────────────────

/// Errors related to region/zone/network validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Availability zone '{zone}' does not belong to region '{region}'.")]
    ZoneOutsideRegion { zone: String, region: String },

    #[error("No subnet of network '{network}' in availability zone '{zone}'.")]
    NoSubnet { zone: String, network: String },

    #[error("Invalid {field}: value must not be empty.")]
    Empty { field: &'static str },
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Errors related to session lifecycle and identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Volume \"{0}\" not found. Run 'ec2-session start {0}' to create it.")]
    VolumeNotFound(String),

    #[error("Operation cancelled by user.")]
    CreationDeclined,

    #[error("Invalid session name '{0}': must match ^[A-Za-z0-9][A-Za-z0-9._-]{{0,127}}$")]
    InvalidName(String),

    #[error("Unknown request type '{0}': should be either 'spot' or 'ondemand'")]
    UnknownStrategy(String),

    #[error("Instance type '{instance_type}' not found in region '{region}'.")]
    InstanceTypeNotFound {
        instance_type: String,
        region: String,
    },

    #[error("No instance types offered in availability zone '{0}'.")]
    NoOfferings(String),

    #[error("Unexpected output from {operation}: {reason}")]
    Malformed { operation: String, reason: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing {what}: pass {flag} or set {env}.")]
    Missing {
        what: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
