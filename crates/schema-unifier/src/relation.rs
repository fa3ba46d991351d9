//! The unified relation as a two-phase value: compose a plan, then run it.
//!
//! Nothing touches a file until a plan is executed. Every plan is a
//! partitioned fold, so memory use is bounded by what the plan keeps
//! (a set of keys, a few sample rows) rather than by the corpus. Only
//! [`LazyRelation::materialize`] holds every row at once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use fare_common::{EngineKind, FareResult, UnifiedRow};

use crate::engine::{RowFilter, ScanJob, Scanned};
use crate::source::{MemorySource, RowSource};

/// An executable query over the unified relation.
pub trait Plan {
    type Output;

    /// Run the plan, reporting snapshots skipped in a partial audit.
    fn execute_scanned(&self) -> FareResult<Scanned<Self::Output>>;

    /// Run the plan and keep only its value.
    fn execute(&self) -> FareResult<Self::Output> {
        self.execute_scanned().map(|scanned| scanned.value)
    }
}

/// A lazily-evaluated, schema-uniform view over every snapshot.
#[derive(Clone)]
pub struct LazyRelation {
    source: Arc<dyn RowSource>,
    filters: Vec<RowFilter>,
    engine: EngineKind,
    partial: bool,
}

impl fmt::Debug for LazyRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRelation")
            .field("source", &self.source)
            .field("filters", &self.filters.len())
            .field("engine", &self.engine)
            .field("partial", &self.partial)
            .finish()
    }
}

impl LazyRelation {
    pub fn new(source: Arc<dyn RowSource>) -> Self {
        Self {
            source,
            filters: Vec::new(),
            engine: EngineKind::default(),
            partial: false,
        }
    }

    /// A relation over rows already in memory, partitioned by `source_sequence`.
    pub fn from_rows(rows: Vec<UnifiedRow>) -> Self {
        Self::new(Arc::new(MemorySource::new(rows)))
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Skip and report snapshots that fail unification instead of failing
    /// the whole plan.
    pub fn allow_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Number of scan partitions (snapshot files, for a store-backed relation).
    pub fn partition_count(&self) -> usize {
        self.source.partition_count()
    }

    /// Keep only rows matching `predicate`.
    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&UnifiedRow) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(predicate));
        self
    }

    /// A general fold: `init` builds a per-partition accumulator, `fold`
    /// feeds it rows, `merge` combines partition results in sequence order.
    pub fn aggregate<A, I, F, M>(&self, init: I, fold: F, merge: M) -> Aggregate<A>
    where
        I: Fn() -> A + Send + Sync + 'static,
        F: Fn(&mut A, UnifiedRow) + Send + Sync + 'static,
        M: Fn(&mut A, A) + Send + Sync + 'static,
    {
        Aggregate {
            relation: self.clone(),
            init: Arc::new(init),
            fold: Arc::new(fold),
            merge: Arc::new(merge),
        }
    }

    /// Sorted, deduplicated projection.
    pub fn distinct<K, P>(&self, key: P) -> Aggregate<BTreeSet<K>>
    where
        K: Ord + Send + 'static,
        P: Fn(&UnifiedRow) -> K + Send + Sync + 'static,
    {
        self.aggregate(
            BTreeSet::new,
            move |set, row| {
                set.insert(key(&row));
            },
            |total, part| total.extend(part),
        )
    }

    /// Key to the sorted set of distinct values seen under it.
    pub fn group_distinct<K, V, PK, PV>(&self, key: PK, value: PV) -> Aggregate<BTreeMap<K, BTreeSet<V>>>
    where
        K: Ord + Send + 'static,
        V: Ord + Send + 'static,
        PK: Fn(&UnifiedRow) -> K + Send + Sync + 'static,
        PV: Fn(&UnifiedRow) -> V + Send + Sync + 'static,
    {
        self.aggregate(
            BTreeMap::new,
            move |groups: &mut BTreeMap<K, BTreeSet<V>>, row| {
                groups.entry(key(&row)).or_default().insert(value(&row));
            },
            |total, part| {
                for (k, values) in part {
                    total.entry(k).or_default().extend(values);
                }
            },
        )
    }

    /// The first `limit` rows per key, in scan order.
    pub fn sample_per_key<K, PK>(&self, key: PK, limit: usize) -> Aggregate<BTreeMap<K, Vec<UnifiedRow>>>
    where
        K: Ord + Send + 'static,
        PK: Fn(&UnifiedRow) -> K + Send + Sync + 'static,
    {
        self.aggregate(
            BTreeMap::new,
            move |samples: &mut BTreeMap<K, Vec<UnifiedRow>>, row| {
                let bucket = samples.entry(key(&row)).or_default();
                if bucket.len() < limit {
                    bucket.push(row);
                }
            },
            move |total, part| {
                for (k, rows) in part {
                    let bucket = total.entry(k).or_default();
                    let room = limit.saturating_sub(bucket.len());
                    bucket.extend(rows.into_iter().take(room));
                }
            },
        )
    }

    pub fn count(&self) -> Aggregate<u64> {
        self.aggregate(|| 0u64, |n, _| *n += 1, |total, part| *total += part)
    }

    /// Every row, in sequence order then file order.
    pub fn rows(&self) -> Aggregate<Vec<UnifiedRow>> {
        self.aggregate(Vec::new, |rows, row| rows.push(row), |total, part| total.extend(part))
    }

    /// Force full evaluation into memory.
    pub fn materialize(&self) -> FareResult<Vec<UnifiedRow>> {
        self.rows().execute()
    }

    fn job(&self) -> ScanJob<'_> {
        ScanJob {
            source: self.source.as_ref(),
            filters: &self.filters,
            engine: self.engine,
            partial: self.partial,
        }
    }
}

type InitFn<A> = Arc<dyn Fn() -> A + Send + Sync>;
type FoldFn<A> = Arc<dyn Fn(&mut A, UnifiedRow) + Send + Sync>;
type MergeFn<A> = Arc<dyn Fn(&mut A, A) + Send + Sync>;

/// A fold plan bound to a relation. Cheap to clone; runs on `execute`.
pub struct Aggregate<A> {
    relation: LazyRelation,
    init: InitFn<A>,
    fold: FoldFn<A>,
    merge: MergeFn<A>,
}

impl<A> Clone for Aggregate<A> {
    fn clone(&self) -> Self {
        Self {
            relation: self.relation.clone(),
            init: Arc::clone(&self.init),
            fold: Arc::clone(&self.fold),
            merge: Arc::clone(&self.merge),
        }
    }
}

impl<A> fmt::Debug for Aggregate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("relation", &self.relation)
            .finish_non_exhaustive()
    }
}

impl<A: Send> Plan for Aggregate<A> {
    type Output = A;

    fn execute_scanned(&self) -> FareResult<Scanned<A>> {
        let init = &self.init;
        let fold = &self.fold;
        let merge = &self.merge;
        self.relation.job().fold(
            || init(),
            |acc, row| fold(acc, row),
            |total, part| merge(total, part),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn row(seq: u64, origin: &str, name: &str) -> UnifiedRow {
        let trip_date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let request_timestamp = NaiveDate::from_ymd_opt(2024, 5, seq as u32)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        UnifiedRow {
            trip_date,
            train_number: "6201".into(),
            origin_code: origin.into(),
            destination_code: "FRMSC".into(),
            departure_time: NaiveTime::from_hms_opt(7, 37, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(10, 55, 0).unwrap(),
            origin_name: name.into(),
            destination_name: "MARSEILLE ST CHARLES".into(),
            has_seat: true,
            request_timestamp,
            source_sequence: seq,
            days_to_trip: (trip_date - request_timestamp.date()).num_days(),
        }
    }

    fn relation() -> LazyRelation {
        LazyRelation::from_rows(vec![
            row(1, "FRPLY", "PARIS"),
            row(1, "FRLYS", "LYON"),
            row(2, "FRPLY", "PARIS (intramuros)"),
            row(2, "FRPLY", "PARIS (intramuros)"),
            row(3, "FRLYS", "LYON"),
        ])
    }

    #[test]
    fn test_count_and_filter() {
        let rel = relation();
        assert_eq!(rel.count().execute().unwrap(), 5);

        let paris = rel.clone().filter(|r| r.origin_code == "FRPLY");
        assert_eq!(paris.count().execute().unwrap(), 3);
        // The original relation is untouched.
        assert_eq!(rel.count().execute().unwrap(), 5);
    }

    #[test]
    fn test_distinct_is_sorted() {
        let codes = relation().distinct(|r| r.origin_code.clone()).execute().unwrap();
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), vec!["FRLYS", "FRPLY"]);
    }

    #[test]
    fn test_group_distinct() {
        let names = relation()
            .group_distinct(|r| r.origin_code.clone(), |r| r.origin_name.clone())
            .execute()
            .unwrap();
        assert_eq!(names["FRPLY"].len(), 2);
        assert_eq!(names["FRLYS"].len(), 1);
    }

    #[test]
    fn test_sample_per_key_keeps_scan_order() {
        let samples = relation()
            .sample_per_key(|r| r.origin_code.clone(), 2)
            .execute()
            .unwrap();
        let paris: Vec<u64> = samples["FRPLY"].iter().map(|r| r.source_sequence).collect();
        assert_eq!(paris, vec![1, 2]);
        let lyon: Vec<u64> = samples["FRLYS"].iter().map(|r| r.source_sequence).collect();
        assert_eq!(lyon, vec![1, 3]);
    }

    #[test]
    fn test_engines_agree() {
        let sequential = relation().materialize().unwrap();
        let parallel = relation()
            .with_engine(EngineKind::Parallel)
            .materialize()
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_empty_relation() {
        let rel = LazyRelation::from_rows(Vec::new());
        assert_eq!(rel.partition_count(), 0);
        assert_eq!(rel.count().execute().unwrap(), 0);
        assert!(rel.distinct(|r| r.source_sequence).execute().unwrap().is_empty());
    }
}
