//! Execution of partitioned folds over a row source.
//!
//! Every plan reduces to the same shape: a fresh accumulator per
//! partition, a fold over the partition's filtered rows, then an in-order
//! merge of the partition accumulators. Memory is bounded by the
//! accumulators, never by the corpus.

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::warn;

use fare_common::{EngineKind, FareError, FareResult, UnifiedRow};

use crate::source::RowSource;

/// A row predicate applied before folding.
pub type RowFilter = Arc<dyn Fn(&UnifiedRow) -> bool + Send + Sync>;

/// A snapshot left out of a partial audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSnapshot {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// A plan result together with any snapshots skipped to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned<T> {
    pub value: T,
    pub skipped: Vec<SkippedSnapshot>,
}

impl<T> Scanned<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Scanned<U> {
        Scanned {
            value: f(self.value),
            skipped: self.skipped,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Everything needed to run one fold.
pub(crate) struct ScanJob<'a> {
    pub source: &'a dyn RowSource,
    pub filters: &'a [RowFilter],
    pub engine: EngineKind,
    pub partial: bool,
}

impl ScanJob<'_> {
    pub(crate) fn fold<A, I, F, M>(&self, init: I, fold: F, merge: M) -> FareResult<Scanned<A>>
    where
        A: Send,
        I: Fn() -> A + Send + Sync,
        F: Fn(&mut A, UnifiedRow) + Send + Sync,
        M: Fn(&mut A, A),
    {
        let count = self.source.partition_count();
        let run = |index: usize| self.fold_partition(index, &init, &fold);

        let mut total = init();
        let mut skipped = Vec::new();

        match self.engine {
            // Merge as each partition finishes so a fatal error stops the scan.
            EngineKind::Sequential => {
                for index in 0..count {
                    self.absorb(index, run(index), &mut total, &mut skipped, &merge)?;
                }
            }
            EngineKind::Parallel => {
                let outcomes: Vec<FareResult<A>> = (0..count).into_par_iter().map(run).collect();
                for (index, outcome) in outcomes.into_iter().enumerate() {
                    self.absorb(index, outcome, &mut total, &mut skipped, &merge)?;
                }
            }
        }

        Ok(Scanned {
            value: total,
            skipped,
        })
    }

    /// Merge one partition's outcome, or record it as skipped in partial mode.
    fn absorb<A, M>(
        &self,
        index: usize,
        outcome: FareResult<A>,
        total: &mut A,
        skipped: &mut Vec<SkippedSnapshot>,
        merge: &M,
    ) -> FareResult<()>
    where
        M: Fn(&mut A, A),
    {
        match outcome {
            Ok(acc) => merge(total, acc),
            Err(err) if self.partial && is_skippable(&err) => {
                let path = err
                    .offending_path()
                    .map(|p| p.to_path_buf())
                    .or_else(|| self.source.partition_path(index));
                warn!(
                    path = ?path,
                    error = %err,
                    "Skipping snapshot in partial audit"
                );
                skipped.push(SkippedSnapshot {
                    path,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn fold_partition<A, I, F>(&self, index: usize, init: &I, fold: &F) -> FareResult<A>
    where
        I: Fn() -> A,
        F: Fn(&mut A, UnifiedRow),
    {
        let mut acc = init();
        let filters = self.filters;
        self.source.scan_partition(index, &mut |row| {
            if filters.iter().all(|keep| keep(&row)) {
                fold(&mut acc, row);
            }
        })?;
        Ok(acc)
    }
}

/// Only per-file unification failures may be skipped; I/O and store
/// errors always abort.
fn is_skippable(err: &FareError) -> bool {
    matches!(err, FareError::SchemaUnification { .. })
}
