//! Snapshot store for daily fare-availability scrapes.
//!
//! Each scrape is persisted once as an immutable file named after its
//! sequence number (`1.csv`, `2.csv`, ...). The store only ever appends
//! `max + 1`; it never renames, rewrites or fills gaps.

pub mod naming;
mod store;

pub use naming::{parse_sequence, Container, SnapshotFile};
pub use store::{SnapshotStore, REQUEST_DATE_COLUMN};
