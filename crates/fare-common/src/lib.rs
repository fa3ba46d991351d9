//! Common types and utilities shared across the fare snapshot audit crates.

pub mod config;
pub mod error;
pub mod row;
pub mod time;

pub use config::{AuditConfig, EngineKind, SUPPORTED_SNAPSHOT_EXTENSIONS};
pub use error::{FareError, FareResult};
pub use row::{RawTable, StationRecord, UnifiedRow};
pub use time::TimeParseError;
