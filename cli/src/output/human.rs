//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::session::{MountOutcome, StartOutcome, StopOutcome};
use crate::domain::instance::SystemInfo;
use crate::domain::report::StatusReport;
use crate::output::OutputContext;

/// Placeholder for a resource the session does not have.
const NOT_FOUND: &str = "Not found";

/// Renders session results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the hierarchical session report.
    pub fn render_status(&self, report: &StatusReport) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.kv("Session ID:", &report.session.style(self.ctx.styles.header).to_string());
        self.ctx.kv("VPC:", &report.vpc_id);
        self.ctx.kv("Region:", &report.region);
        self.ctx.kv("Availability zone:", &report.availability_zone);

        match &report.instance {
            Some(instance) => {
                self.ctx.kv("Instance:", &instance.label());
                if let Some(system) = &instance.system {
                    self.render_system_lines(system, "    ");
                }
                self.nested("IP", instance.private_ip.as_deref().unwrap_or(NOT_FOUND));
                if let Some(ssh) = instance.ssh_hint() {
                    self.nested("SSH", &ssh);
                }
                if let Some(status) = &instance.status {
                    self.nested("Status", status);
                }
            }
            None => self.ctx.kv("Instance:", NOT_FOUND),
        }

        self.ctx.kv("Subnet:", &report.subnet_id);
        self.ctx
            .kv("Volume:", report.volume_id.as_deref().unwrap_or(NOT_FOUND));
        self.ctx.kv(
            "Network:",
            report.network_interface_id.as_deref().unwrap_or(NOT_FOUND),
        );
    }

    fn nested(&self, key: &str, value: &str) {
        println!("      {}  {value}", format!("{key}:").style(self.ctx.styles.dim));
    }

    fn render_system_lines(&self, system: &SystemInfo, indent: &str) {
        for (key, value) in system.lines() {
            println!(
                "  {indent}{}  {value}",
                format!("{key}:").style(self.ctx.styles.dim)
            );
        }
    }

    /// Render vCPU, memory and GPU of one instance type.
    pub fn render_system_info(&self, system: &SystemInfo) {
        if self.ctx.quiet {
            return;
        }
        self.render_system_lines(system, "");
    }

    /// Render the instance types offered in a zone, one per line.
    pub fn render_offerings(&self, zone: &str, types: &[String]) {
        if self.ctx.quiet {
            return;
        }
        self.ctx
            .header(&format!("{} instance types offered in {zone}", types.len()));
        for t in types {
            println!("    {t}");
        }
    }

    pub fn render_start(&self, session: &str, outcome: &StartOutcome) {
        match outcome {
            StartOutcome::AlreadyRunning { instance_id } => {
                self.ctx
                    .info(&format!("Session {session} already running on {instance_id}"));
            }
            StartOutcome::Started {
                instance_id,
                volume_id,
                bootstrapped_volume,
                status,
            } => {
                if *bootstrapped_volume {
                    self.ctx.success(&format!("Volume {volume_id} created"));
                }
                self.ctx.success(&format!(
                    "Session {session} started on {instance_id} with volume {volume_id}"
                ));
                self.render_status(status);
            }
        }
    }

    pub fn render_stop(&self, session: &str, outcome: &StopOutcome) {
        match outcome {
            StopOutcome::VolumeNotFound => {
                self.ctx.warn(&format!("Volume {session} not found"));
            }
            StopOutcome::NoInstance { volume_id } => {
                self.ctx
                    .info(&format!("No instance running on volume {volume_id}"));
            }
            StopOutcome::Terminated {
                instance_id,
                volume_id,
            } => {
                self.ctx.success(&format!(
                    "Session {session} stopped: {instance_id} terminated, volume {volume_id} kept"
                ));
            }
        }
    }

    /// Print the address alone, so it can be captured by scripts.
    pub fn render_ip(&self, ip: Option<&str>) {
        if let Some(ip) = ip {
            println!("{ip}");
        }
    }

    pub fn render_mount(&self, filesystem: &str, outcome: &MountOutcome) {
        match outcome {
            MountOutcome::Declined => {
                self.ctx.info(&format!("Filesystem {filesystem} not created"));
            }
            MountOutcome::NoInstance {
                filesystem_id,
                created,
            } => {
                if *created {
                    self.ctx.success(&format!("Filesystem {filesystem_id} created"));
                }
                self.ctx
                    .warn(&format!("No instance running; {filesystem_id} not mounted"));
            }
            MountOutcome::Mounted {
                filesystem_id,
                instance_id,
                created,
            } => {
                if *created {
                    self.ctx.success(&format!("Filesystem {filesystem_id} created"));
                }
                self.ctx
                    .success(&format!("Filesystem {filesystem_id} mounted on {instance_id}"));
            }
        }
    }
}
