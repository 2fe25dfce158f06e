//! `ControlPlane` backed by the `aws` command-line tool.

use anyhow::Result;

use crate::application::ports::{CommandRunner, ControlPlane};
use crate::domain::{Operation, ProcessResult};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, WAIT_TIMEOUT};

/// Program invoked for every operation.
pub const AWS_PROGRAM: &str = "aws";

/// Runs operations as `aws <service> <verb> <args> --region <region>`.
pub struct AwsCli<R> {
    runner: R,
}

impl<R: CommandRunner> AwsCli<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> ControlPlane for AwsCli<R> {
    async fn execute(&self, operation: &Operation) -> Result<ProcessResult> {
        let line = operation.command_line();
        let args: Vec<&str> = line.iter().map(String::as_str).collect();
        let timeout = if operation.is_wait() {
            WAIT_TIMEOUT
        } else {
            DEFAULT_CMD_TIMEOUT
        };

        tracing::debug!(command = %operation, "control-plane request");
        let output = self
            .runner
            .run_with_timeout(AWS_PROGRAM, &args, timeout)
            .await?;

        let result = ProcessResult::classify(
            &operation.describe(),
            output.status.code(),
            &output.stdout,
            &output.stderr,
        );
        match &result {
            ProcessResult::Ok(payload) => {
                tracing::debug!(operation = %operation.describe(), %payload, "control-plane response");
            }
            ProcessResult::Empty { raw, .. } => {
                tracing::debug!(operation = %operation.describe(), %raw, "control-plane returned nothing");
            }
            ProcessResult::Failed(err) => {
                tracing::error!(
                    code = %err.code,
                    operation = %err.operation,
                    detail = %err.detail,
                    "control-plane call failed"
                );
            }
        }
        Ok(result)
    }
}
