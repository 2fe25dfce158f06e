//! Shared test helpers: recording ports, session fixtures and output constructors.

#![allow(dead_code, clippy::expect_used)]

use std::process::{ExitStatus, Output};
use std::sync::Mutex;

use anyhow::Result;
use ec2_session::application::ports::{ProgressReporter, Prompt};
use ec2_session::application::services::location::LocationContext;
use ec2_session::application::services::session::{Session, StartRequest};
use ec2_session::domain::{
    Credentials, Location, MachineImage, SecurityPolicy, SessionName, Sizing, Strategy,
};

use crate::fake_cloud::{REGION, SECURITY_GROUP, VPC, ZONE};

// ── Cross-platform ExitStatus construction ───────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success, non-zero = failure).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15, so we shift.
/// On Windows `ExitStatusExt::from_raw` takes the exit code directly.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

// ── Output constructors ──────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Reporters ────────────────────────────────────────────────────────────────

/// Discards every progress event.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

/// Records progress events as `"<kind>: <message>"`.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }

    fn push(&self, kind: &str, message: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{kind}: {message}"));
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push("step", message);
    }
    fn success(&self, message: &str) {
        self.push("success", message);
    }
    fn warn(&self, message: &str) {
        self.push("warn", message);
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────────

/// Answers every question the same way and records what was asked.
pub struct ScriptedPrompt {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn yes() -> Self {
        Self::answering(true)
    }

    pub fn no() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("asked lock").clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str, _default: bool) -> Result<bool> {
        self.asked
            .lock()
            .expect("asked lock")
            .push(question.to_string());
        Ok(self.answer)
    }
}

/// Fails the test when asked anything.
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn confirm(&self, question: &str, _default: bool) -> Result<bool> {
        anyhow::bail!("unexpected question: {question}")
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn session(name: &str) -> Session {
    let location = Location::new(REGION, ZONE, VPC).expect("valid location");
    Session::new(
        SessionName::parse(name).expect("valid session name"),
        LocationContext::new(location),
        SecurityPolicy::new(SECURITY_GROUP),
    )
}

pub fn image() -> MachineImage {
    MachineImage {
        ami_id: "ami-0123".to_string(),
        instance_role: "arn:aws:iam::123456789012:instance-profile/session".to_string(),
        public_key: "ops".to_string(),
    }
}

pub fn sizing() -> Sizing {
    Sizing {
        instance_type: "r5.large".to_string(),
        volume_size: 64,
        instance_volume_size: 30,
        bid_price: "0.5".to_string(),
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        access_key_id: "AKIAEXAMPLE".to_string(),
        secret_access_key: "secret".to_string(),
        region: None,
    }
}

pub fn start_request<'a>(
    strategy: Strategy,
    image: &'a MachineImage,
    sizing: &'a Sizing,
) -> StartRequest<'a> {
    StartRequest {
        strategy,
        instance_name: None,
        image,
        sizing,
        credentials: None,
    }
}
