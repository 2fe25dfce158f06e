//! Tests for `AwsCli`: argument vectors, timeouts and result classification.

#![allow(clippy::expect_used)]

use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use ec2_session::application::ports::{CommandRunner, ControlPlane};
use ec2_session::domain::operation::{OutputFormat, name_filter};
use ec2_session::domain::{CommandError, Operation, ProcessResult};
use ec2_session::infra::aws::{AWS_PROGRAM, AwsCli};
use ec2_session::infra::command_runner::{DEFAULT_CMD_TIMEOUT, WAIT_TIMEOUT};

use crate::helpers::{err_output, ok_output};

// ── Mock: scripted runner ────────────────────────────────────────────────────

struct Invocation {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

/// Shared view of what a [`ScriptedRunner`] was asked to run.
#[derive(Clone, Default)]
struct InvocationLog(Arc<Mutex<Vec<Invocation>>>);

impl InvocationLog {
    fn last(&self) -> (String, Vec<String>, Duration) {
        let calls = self.0.lock().expect("lock");
        let last = calls.last().expect("runner was called");
        (last.program.clone(), last.args.clone(), last.timeout)
    }
}

/// Returns one canned output and records how it was called.
struct ScriptedRunner {
    output: Output,
    log: InvocationLog,
}

impl ScriptedRunner {
    fn new(output: Output) -> Self {
        Self {
            output,
            log: InvocationLog::default(),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, DEFAULT_CMD_TIMEOUT).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        self.log.0.lock().expect("lock").push(Invocation {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            timeout,
        });
        Ok(self.output.clone())
    }
}

/// Fails to spawn anything.
struct BrokenRunner;

impl CommandRunner for BrokenRunner {
    async fn run(&self, _: &str, _: &[&str]) -> Result<Output> {
        anyhow::bail!("failed to spawn aws")
    }

    async fn run_with_timeout(&self, _: &str, _: &[&str], _: Duration) -> Result<Output> {
        anyhow::bail!("failed to spawn aws")
    }
}

fn describe_volume() -> Operation {
    Operation::ec2("describe-volumes", "eu-west-2")
        .arg_list("--filters", [name_filter("apps")])
        .query("Volumes[0].VolumeId")
        .output(OutputFormat::Text)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn payload_is_trimmed() {
    let runner = ScriptedRunner::new(ok_output(b"vol-0abc\n"));
    let cloud = AwsCli::new(runner);

    let result = cloud.execute(&describe_volume()).await.expect("call");
    assert_eq!(result, ProcessResult::Ok("vol-0abc".to_string()));
}

#[tokio::test]
async fn regular_calls_use_default_timeout_and_waits_the_long_one() {
    let runner = ScriptedRunner::new(ok_output(b""));
    let log = runner.log.clone();
    let cloud = AwsCli::new(runner);

    cloud.execute(&describe_volume()).await.expect("call");
    let (program, args, timeout) = log.last();
    assert_eq!(program, AWS_PROGRAM);
    assert_eq!(args[..2], ["ec2", "describe-volumes"]);
    assert_eq!(args[args.len() - 2..], ["--region", "eu-west-2"]);
    assert_eq!(timeout, DEFAULT_CMD_TIMEOUT);

    let wait = Operation::ec2_wait("volume-available", "eu-west-2").arg("--volume-ids", "vol-1");
    cloud.execute(&wait).await.expect("call");
    let (_, args, timeout) = log.last();
    assert_eq!(args[..3], ["ec2", "wait", "volume-available"]);
    assert_eq!(timeout, WAIT_TIMEOUT);
}

#[tokio::test]
async fn sentinel_output_is_empty() {
    let cloud = AwsCli::new(ScriptedRunner::new(ok_output(b"None\n")));
    let result = cloud.execute(&describe_volume()).await.expect("call");

    assert!(matches!(result, ProcessResult::Empty { .. }));
    let err = result.result().expect_err("strict consumer rejects empty");
    assert!(matches!(err, CommandError::EmptyOutput { .. }));
}

#[tokio::test]
async fn rejected_call_is_classified_not_raised() {
    let stderr = b"\nAn error occurred (InvalidVolume.NotFound) when calling the DescribeVolumes \
                   operation: The volume 'vol-0abc' does not exist.\n";
    let cloud = AwsCli::new(ScriptedRunner::new(err_output(254, stderr)));

    let result = cloud.execute(&describe_volume()).await.expect("transport ok");
    let ProcessResult::Failed(err) = result else {
        panic!("expected Failed");
    };
    assert_eq!(err.code, "InvalidVolume.NotFound");
    assert_eq!(err.operation, "DescribeVolumes");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn unrecognised_stderr_is_kept_verbatim() {
    let cloud = AwsCli::new(ScriptedRunner::new(err_output(
        255,
        b"Unable to locate credentials. You can configure credentials by running \"aws configure\".",
    )));

    let result = cloud.execute(&describe_volume()).await.expect("transport ok");
    let ProcessResult::Failed(err) = result else {
        panic!("expected Failed");
    };
    assert_eq!(err.code, "Unknown");
    assert_eq!(err.operation, "ec2 describe-volumes");
    assert!(err.detail.starts_with("Unable to locate credentials"));
}

#[tokio::test]
async fn transport_failure_is_an_error() {
    let cloud = AwsCli::new(BrokenRunner);
    let err = cloud.execute(&describe_volume()).await.expect_err("spawn fails");
    assert!(err.to_string().contains("failed to spawn"));
}
