//! Advisory name matching between observed station names and the catalog.
//!
//! Scores only rank candidates for a human to review. Nothing here decides
//! that an orphan code *is* a catalog station.

use serde::Serialize;
use strsim::jaro_winkler;

use crate::catalog::StationCatalog;

/// A catalog station ranked against an orphan's observed names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub code: String,
    pub name: String,
    /// Jaro-Winkler similarity in `[0, 1]`, higher is closer
    pub score: f64,
}

/// Lowercase, drop the `(intramuros)` style qualifiers and collapse
/// separators so that `PARIS (intramuros)` and `Paris` compare close.
fn normalize_name(name: &str) -> String {
    let mut base = name.to_lowercase();
    if let Some(idx) = base.find('(') {
        base.truncate(idx);
    }
    base.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best similarity between any observed name and `candidate`.
pub fn similarity<'a>(observed: impl IntoIterator<Item = &'a str>, candidate: &str) -> f64 {
    let candidate = normalize_name(candidate);
    observed
        .into_iter()
        .map(|name| jaro_winkler(&normalize_name(name), &candidate))
        .fold(0.0, f64::max)
}

/// Rank catalog stations by similarity to `observed`, best first, keeping
/// at most `limit`. Ties are broken by code.
pub fn rank_candidates(observed: &[String], catalog: &StationCatalog, limit: usize) -> Vec<MatchCandidate> {
    let mut candidates: Vec<MatchCandidate> = catalog
        .iter()
        .map(|station| MatchCandidate {
            code: station.code.clone(),
            name: station.name.clone(),
            score: similarity(observed.iter().map(String::as_str), &station.name),
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.code.cmp(&b.code)));
    candidates.truncate(limit);
    candidates
}
