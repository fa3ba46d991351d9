//! Schema unification for historical fare snapshots.
//!
//! The snapshot store holds several generations of the upstream export
//! format. This crate hides that history behind one lazily-evaluated,
//! statically-typed relation of [`UnifiedRow`](fare_common::UnifiedRow)s.
//!
//! # Architecture
//!
//! - [`format`] decides each file's [`FormatVersion`] once, from its header
//! - [`normalize`] holds one normalizer per version and derives `has_seat`
//!   and `days_to_trip`
//! - [`reader`] streams one file through its normalizer
//! - [`LazyRelation`] composes plans; [`Plan::execute`] runs them on the
//!   sequential or rayon engine, one partition per snapshot file

mod engine;
pub mod format;
pub mod normalize;
pub mod reader;
mod relation;
mod source;
mod unifier;

// Re-exports
pub use engine::{RowFilter, Scanned, SkippedSnapshot};
pub use format::{ColumnLayout, FormatVersion};
pub use reader::{probe_file, read_snapshot, FileSummary, SnapshotHeader};
pub use relation::{Aggregate, LazyRelation, Plan};
pub use source::{MemorySource, RowSource, SnapshotScan};
pub use unifier::SchemaUnifier;
