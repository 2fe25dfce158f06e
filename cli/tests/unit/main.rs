//! Unit tests for ec2-session
//!
//! These tests run the session services against an in-memory control plane
//! and never spawn `aws`.

mod architecture;
mod aws_control_plane;
mod catalog_service;
mod filesystem_service;
mod helpers;
mod provision_service;
mod volume_service;
