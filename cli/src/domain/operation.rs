//! Control-plane operations as plain data.
//!
//! An `Operation` is a service, a verb and its arguments, scoped to a region.
//! Builders keep call sites close to the shape of the `aws` command line while
//! letting tests inspect arguments without parsing strings.

use std::fmt;

/// Control-plane service addressed by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Ec2,
    Efs,
}

impl Service {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ec2 => "ec2",
            Self::Efs => "efs",
        }
    }
}

/// Output format requested from the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One control-plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub service: Service,
    pub verb: String,
    pub args: Vec<String>,
    pub region: String,
}

impl Operation {
    #[must_use]
    pub fn ec2(verb: &str, region: &str) -> Self {
        Self::new(Service::Ec2, verb, region)
    }

    #[must_use]
    pub fn efs(verb: &str, region: &str) -> Self {
        Self::new(Service::Efs, verb, region)
    }

    /// `aws ec2 wait <waiter>`.
    #[must_use]
    pub fn ec2_wait(waiter: &str, region: &str) -> Self {
        let mut op = Self::new(Service::Ec2, "wait", region);
        op.args.push(waiter.to_string());
        op
    }

    fn new(service: Service, verb: &str, region: &str) -> Self {
        Self {
            service,
            verb: verb.to_string(),
            args: Vec::new(),
            region: region.to_string(),
        }
    }

    /// Append `flag value`.
    #[must_use]
    pub fn arg(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.into());
        self
    }

    /// Append `flag v1 v2 ...`.
    #[must_use]
    pub fn arg_list<I, S>(mut self, flag: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.push(flag.to_string());
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Append a bare switch such as `--force`.
    #[must_use]
    pub fn switch(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    #[must_use]
    pub fn query(self, query: &str) -> Self {
        self.arg("--query", query)
    }

    #[must_use]
    pub fn output(self, format: OutputFormat) -> Self {
        let value = match format {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        };
        self.arg("--output", value)
    }

    /// Whether this operation blocks on a remote state transition.
    #[must_use]
    pub fn is_wait(&self) -> bool {
        self.verb == "wait"
    }

    /// The waiter name of a `wait` operation.
    #[must_use]
    pub fn waiter(&self) -> Option<&str> {
        if self.is_wait() {
            self.args.first().map(String::as_str)
        } else {
            None
        }
    }

    /// First value following `flag`.
    #[must_use]
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.values_of(flag).into_iter().next()
    }

    /// All values following `flag`, up to the next `--` flag.
    #[must_use]
    pub fn values_of(&self, flag: &str) -> Vec<&str> {
        let Some(pos) = self.args.iter().position(|a| a == flag) else {
            return Vec::new();
        };
        self.args[pos + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn has_switch(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Short description used in logs and error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.waiter() {
            Some(waiter) => format!("{} wait {waiter}", self.service.as_str()),
            None => format!("{} {}", self.service.as_str(), self.verb),
        }
    }

    /// Full argument vector for the `aws` program.
    #[must_use]
    pub fn command_line(&self) -> Vec<String> {
        let mut line = Vec::with_capacity(self.args.len() + 4);
        line.push(self.service.as_str().to_string());
        line.push(self.verb.clone());
        line.extend(self.args.iter().cloned());
        line.push("--region".to_string());
        line.push(self.region.clone());
        line
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "aws {}", self.command_line().join(" "))
    }
}

// ── Filters and tags ──────────────────────────────────────────────────────────

/// Filter on the `Name` tag.
#[must_use]
pub fn name_filter(name: &str) -> String {
    format!("Name=tag:Name,Values={name}")
}

/// Filter on the availability zone.
#[must_use]
pub fn zone_filter(zone: &str) -> String {
    format!("Name=availability-zone,Values={zone}")
}

/// Filter on the network (VPC) id.
#[must_use]
pub fn network_filter(network_id: &str) -> String {
    format!("Name=vpc-id,Values={network_id}")
}

/// Tag specification `Key=<key>,Value=<value>`.
#[must_use]
pub fn tag(key: &str, value: &str) -> String {
    format!("Key={key},Value={value}")
}

/// Extract the value of a `Name=<name>,Values=<value>` filter.
#[must_use]
pub fn filter_value<'a>(filters: &[&'a str], name: &str) -> Option<&'a str> {
    let prefix = format!("Name={name},Values=");
    filters.iter().find_map(|f| f.strip_prefix(prefix.as_str()))
}

/// Extract the value of a `Key=<key>,Value=<value>` tag.
#[must_use]
pub fn tag_value<'a>(tags: &[&'a str], key: &str) -> Option<&'a str> {
    let prefix = format!("Key={key},Value=");
    tags.iter().find_map(|t| t.strip_prefix(prefix.as_str()))
}
