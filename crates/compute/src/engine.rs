use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use callscope_core::{CallHistory, CallRecord, FilterSpec, ReferenceTables, TableStore};

use crate::error::{ComputeError, Result};
use crate::filter::filter_records;
use crate::stats::{aggregate_partial, StatisticsReport};

/// Statistics front end bound to one immutable table snapshot.
///
/// Cheap to clone; clones share the snapshot. Every call builds its own
/// accumulators, so concurrent calls never see each other's state.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    tables: Arc<ReferenceTables>,
    strict: bool,
    workers: usize,
}

impl AnalyticsEngine {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self {
            tables,
            strict: false,
            workers: 0,
        }
    }

    /// Bind to the store's current snapshot.
    pub fn from_store(store: &TableStore) -> Self {
        Self::new(store.snapshot())
    }

    /// Fail aggregation when a reference table is missing.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Threads for [`statistics_batch`](Self::statistics_batch) (0 = rayon default).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Filter, then aggregate.
    pub fn run(&self, records: &[CallRecord], filters: Option<&FilterSpec>) -> Result<StatisticsReport> {
        if self.strict {
            if let Some(kind) = self.tables.missing().into_iter().next() {
                return Err(ComputeError::MissingTable(kind));
            }
        }
        let filtered = filter_records(records, filters)?;
        let report = aggregate_partial(filtered, &self.tables);
        if !report.missing_tables.is_empty() {
            warn!(missing = ?report.missing_tables, "geographic attribution incomplete");
        }
        Ok(report)
    }

    /// Statistics for a submitted call history, honouring its filters.
    pub fn statistics(&self, history: &CallHistory) -> Result<StatisticsReport> {
        self.run(&history.call_history, history.filters.as_ref())
    }

    /// Evaluate independent call histories in parallel.
    ///
    /// Results are in input order and equal to evaluating each one alone.
    pub fn statistics_batch(&self, histories: &[CallHistory]) -> Result<Vec<Result<StatisticsReport>>> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;

        let results: Vec<_> = pool.install(|| {
            histories
                .par_iter()
                .map(|history| self.statistics(history))
                .collect()
        });

        info!(
            histories = histories.len(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch statistics complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use callscope_core::{CallType, PrefixTable, TableKind};

    use super::*;

    fn tables() -> Arc<ReferenceTables> {
        Arc::new(ReferenceTables::new(
            PrefixTable::new([("Kazakhstan", vec!["+77"])]),
            PrefixTable::new([("Almaty", vec!["727"])]),
        ))
    }

    fn make_history(n: usize, filters: Option<FilterSpec>) -> CallHistory {
        let call_history = (0..n)
            .map(|i| CallRecord {
                call_type: Some(if i % 2 == 0 { CallType::Incoming } else { CallType::Outgoing }),
                app: Some("unknown".into()),
                number: Some(format!("+7701000{:04}", i % 7)),
                duration: Some(i as f64),
                timestamp: Some(format!("2024-01-{:02}T{:02}:00:00", 1 + i % 5, i % 24)),
                ..Default::default()
            })
            .collect();
        CallHistory {
            call_history,
            filters,
            language: None,
        }
    }

    #[test]
    fn statistics_applies_history_filters() {
        let engine = AnalyticsEngine::new(tables());
        let history = make_history(
            10,
            Some(FilterSpec {
                call_type: Some("incoming".into()),
                ..Default::default()
            }),
        );
        let report = engine.statistics(&history).unwrap();
        assert_eq!(report.statistics.incoming, 5);
        assert_eq!(report.statistics.outgoing, 0);
    }

    #[test]
    fn invalid_filter_bound_fails_call() {
        let engine = AnalyticsEngine::new(tables());
        let history = make_history(
            3,
            Some(FilterSpec {
                start_time: Some("soon".into()),
                ..Default::default()
            }),
        );
        assert!(matches!(
            engine.statistics(&history),
            Err(ComputeError::InvalidBound { .. })
        ));
    }

    #[test]
    fn strict_engine_rejects_missing_tables() {
        let partial = Arc::new(ReferenceTables {
            country: Some(PrefixTable::default()),
            city: None,
        });
        let history = make_history(2, None);

        let lenient = AnalyticsEngine::new(Arc::clone(&partial));
        let report = lenient.statistics(&history).unwrap();
        assert_eq!(report.missing_tables, vec![TableKind::City]);

        let strict = AnalyticsEngine::new(partial).with_strict(true);
        assert!(matches!(
            strict.statistics(&history),
            Err(ComputeError::MissingTable(TableKind::City))
        ));
    }

    #[test]
    fn batch_matches_sequential() {
        let engine = AnalyticsEngine::new(tables()).with_workers(4);
        let histories: Vec<_> = (1..12).map(|n| make_history(n * 3, None)).collect();

        let parallel = engine.statistics_batch(&histories).unwrap();
        assert_eq!(parallel.len(), histories.len());
        for (history, result) in histories.iter().zip(parallel) {
            let sequential = engine.statistics(history).unwrap();
            assert_eq!(result.unwrap(), sequential);
        }
    }
}
