//! Shared test utilities for the maxjeune-audit workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Snapshot writers for every historical format generation
//! - Expected unified rows for those snapshots
//! - Station catalog fixtures
//! - Throwaway store directories
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{store_dir, write_snapshot, Generation, TripSpec};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// A fresh temporary directory to use as a snapshot store.
pub fn store_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}
