//! Tri-state outcome of a single control-plane call.
//!
//! Pure classification only: the transport hands over exit code and captured
//! streams, this module decides between `Ok`, `Empty` and `Failed`.

use serde::de::DeserializeOwned;

use crate::domain::error::{CommandError, RemoteError, SessionError};

/// Payloads the control plane prints when a query matched nothing.
const SENTINELS: &[&str] = &["None", "null"];

/// Returns `true` when `output` carries a meaningful payload.
#[must_use]
pub fn is_valid_output(output: &str) -> bool {
    let trimmed = output.trim();
    !trimmed.is_empty() && !SENTINELS.contains(&trimmed)
}

/// Outcome of one control-plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// Success with a meaningful payload (trimmed stdout).
    Ok(String),
    /// Success, but the payload was empty or a sentinel.
    Empty { raw: String, operation: String },
    /// The remote side rejected the call.
    Failed(RemoteError),
}

impl ProcessResult {
    /// Classify a finished call.
    #[must_use]
    pub fn classify(
        operation: &str,
        exit_code: Option<i32>,
        stdout: &[u8],
        stderr: &[u8],
    ) -> Self {
        if exit_code == Some(0) {
            let value = String::from_utf8_lossy(stdout).trim().to_string();
            if is_valid_output(&value) {
                Self::Ok(value)
            } else {
                Self::Empty {
                    raw: value,
                    operation: operation.to_string(),
                }
            }
        } else {
            Self::Failed(RemoteError::parse(
                &String::from_utf8_lossy(stderr),
                operation,
                exit_code,
            ))
        }
    }

    /// Obtain the payload; both `Empty` and `Failed` are errors.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::EmptyOutput` for an empty result and
    /// `CommandError::Remote` for a rejected call.
    pub fn result(self) -> Result<String, CommandError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Empty { raw, operation } => Err(CommandError::EmptyOutput { operation, raw }),
            Self::Failed(err) => Err(err.into()),
        }
    }

    /// Deserialize the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not `Ok` or the payload does not
    /// match `T`.
    pub fn json<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        let operation = self.operation_hint();
        let value = self.result()?;
        serde_json::from_str(&value).map_err(|e| {
            SessionError::Malformed {
                operation,
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Map `Empty` to `None`; only a remote failure is an error.
    ///
    /// # Errors
    ///
    /// Returns the `RemoteError` of a `Failed` result.
    pub fn optional(self) -> Result<Option<String>, RemoteError> {
        match self {
            Self::Ok(value) => Ok(Some(value)),
            Self::Empty { .. } => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }

    /// Tolerate `Ok` and `Empty`, propagate `Failed`.
    ///
    /// # Errors
    ///
    /// Returns the `RemoteError` of a `Failed` result.
    pub fn should_not_fail(self) -> Result<Self, RemoteError> {
        match self {
            Self::Failed(err) => Err(err),
            other => Ok(other),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn operation_hint(&self) -> String {
        match self {
            Self::Ok(_) => "control-plane call".to_string(),
            Self::Empty { operation, .. } => operation.clone(),
            Self::Failed(err) => err.operation.clone(),
        }
    }
}

/// First whitespace-separated token of a text payload.
///
/// Text queries over `[*]` projections may print several values on one line.
#[must_use]
pub fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or(value)
}
