//! Command implementations for the snapshot auditor binary.
//!
//! The binary only parses arguments and installs logging; everything it
//! runs lives here so it can be exercised from tests.

pub mod commands;
pub mod config;
pub mod report;

pub use config::{apply_overrides, load_config, CliOverrides};
