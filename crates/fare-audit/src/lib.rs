//! Audits over the unified fare snapshot relation.
//!
//! - [`audit_completeness`] checks the daily scrape cadence
//! - [`IdentityResolver`] finds station codes whose name drifted and codes
//!   missing from the [`StationCatalog`]
//!
//! Both only read through a [`LazyRelation`](schema_unifier::LazyRelation);
//! neither touches snapshot files directly.

pub mod catalog;
pub mod completeness;
pub mod identity;
pub mod similarity;

pub use catalog::StationCatalog;
pub use completeness::{
    audit_completeness, gap_statistics, scrape_events, CompletenessReport, ScrapeEvent,
    SkippedFile,
};
pub use identity::{IdentityResolver, NameDrift, OrphanReport};
pub use similarity::{rank_candidates, MatchCandidate};
