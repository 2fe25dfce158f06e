//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod instance;
pub mod launch;
pub mod location;
pub mod operation;
pub mod process;
pub mod report;
pub mod session;

pub use config::{Credentials, SessionConfig};
pub use error::{CommandError, ConfigError, LocationError, RemoteError, SessionError};
pub use location::{Location, SecurityPolicy};
pub use operation::Operation;
pub use process::ProcessResult;
pub use session::{MachineImage, SessionName, Sizing, Strategy};
