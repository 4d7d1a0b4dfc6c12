//! Dashboard assembly.
//!
//! Reads a statistics snapshot, derives the operator summary and runs the two
//! bounded recency queries. Collaborator failures stop here: the caller always
//! gets a [`DashboardView`], never an error.

use crate::error::DashboardError;
use crate::metrics;
use crate::model::{
    DashboardData, DashboardSummary, DashboardView, ExtractedRecord, OperationLogEntry,
    StatsSnapshot,
};
use crate::stats::StatsSource;
use crate::storage::{LogStore, RecordsStore};
use std::num::NonZeroUsize;
use std::sync::Arc;

pub const DEFAULT_RECORDS_LIMIT: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => unreachable!(),
};
pub const DEFAULT_LOGS_LIMIT: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub records: NonZeroUsize,
    pub logs: NonZeroUsize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            records: DEFAULT_RECORDS_LIMIT,
            logs: DEFAULT_LOGS_LIMIT,
        }
    }
}

/// Derive the operator-facing figures from a counter snapshot.
///
/// Counters that break `succeeded + failed <= processed` are logged and the
/// rate is computed with `succeeded` capped at `processed`.
pub fn build_summary(stats: &StatsSnapshot) -> DashboardSummary {
    if let Err(e) = stats.validate() {
        tracing::warn!(error = %e, "clamping success rate");
    }
    DashboardSummary {
        processed: stats.processed,
        succeeded: stats.succeeded,
        failed: stats.failed,
        success_rate_percent: metrics::success_rate_percent(stats.succeeded, stats.processed),
        companies_found: stats.companies_found,
        products_found: stats.products_found,
        emails_extracted: stats.emails_extracted,
        phones_extracted: stats.phones_extracted,
    }
}

#[derive(Clone)]
pub struct DashboardQueryFacade {
    stats: Arc<dyn StatsSource>,
    records: Arc<dyn RecordsStore>,
    logs: Arc<dyn LogStore>,
    limits: QueryLimits,
}

impl DashboardQueryFacade {
    pub fn new(
        stats: Arc<dyn StatsSource>,
        records: Arc<dyn RecordsStore>,
        logs: Arc<dyn LogStore>,
        limits: QueryLimits,
    ) -> Self {
        Self {
            stats,
            records,
            logs,
            limits,
        }
    }

    pub fn recent_records(
        &self,
        limit: NonZeroUsize,
    ) -> Result<Vec<ExtractedRecord>, DashboardError> {
        fetch_recent(self.records.as_ref(), limit)
    }

    pub fn recent_log_entries(
        &self,
        limit: NonZeroUsize,
    ) -> Result<Vec<OperationLogEntry>, DashboardError> {
        fetch_recent_logs(self.logs.as_ref(), limit)
    }

    /// Build one complete dashboard view.
    ///
    /// The statistics read and both recency queries run concurrently on the
    /// blocking pool, and all three finish before any result is used. Any failure
    /// (statistics, either store, or a worker panic) yields
    /// [`DashboardView::Degraded`] carrying a single display message.
    pub async fn assemble(&self) -> DashboardView {
        match self.try_assemble().await {
            Ok(data) => {
                tracing::debug!(
                    records = data.recent_records.len(),
                    logs = data.recent_logs.len(),
                    "dashboard assembled"
                );
                DashboardView::Ready(data)
            }
            Err(e) => {
                tracing::warn!(error = %e, "dashboard degraded");
                DashboardView::Degraded {
                    error: format!("Error loading dashboard: {e}"),
                }
            }
        }
    }

    async fn try_assemble(&self) -> Result<DashboardData, DashboardError> {
        let stats = self.stats.clone();
        let records_store = self.records.clone();
        let logs_store = self.logs.clone();
        let records_limit = self.limits.records;
        let logs_limit = self.limits.logs;

        let stats_task = tokio::task::spawn_blocking(move || stats.snapshot());
        let records_task = tokio::task::spawn_blocking(move || {
            fetch_recent(records_store.as_ref(), records_limit)
        });
        let logs_task = tokio::task::spawn_blocking(move || {
            fetch_recent_logs(logs_store.as_ref(), logs_limit)
        });

        let (snapshot, records, logs) =
            futures::future::join3(stats_task, records_task, logs_task).await;
        let snapshot = snapshot.map_err(|e| DashboardError::unavailable("statistics source", e))??;
        let recent_records =
            records.map_err(|e| DashboardError::unavailable("records store", e))??;
        let recent_logs = logs.map_err(|e| DashboardError::unavailable("operations log", e))??;

        Ok(DashboardData {
            summary: build_summary(&snapshot),
            recent_records,
            recent_logs,
        })
    }
}

// The store contract already bounds the result; the truncate guards against a
// collaborator that returns more than it was asked for.
fn fetch_recent(
    store: &dyn RecordsStore,
    limit: NonZeroUsize,
) -> Result<Vec<ExtractedRecord>, DashboardError> {
    let mut rows = store.get_recent(limit.get())?;
    rows.truncate(limit.get());
    Ok(rows)
}

fn fetch_recent_logs(
    store: &dyn LogStore,
    limit: NonZeroUsize,
) -> Result<Vec<OperationLogEntry>, DashboardError> {
    let mut rows = store.get_recent(limit.get())?;
    rows.truncate(limit.get());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogLevel;
    use crate::stats::RunStatistics;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Rows kept in append order; recency queries walk them backwards.
    struct MemoryStore<T> {
        rows: Vec<T>,
        calls: AtomicUsize,
    }

    impl<T: Clone> MemoryStore<T> {
        fn new(rows: Vec<T>) -> Self {
            Self {
                rows,
                calls: AtomicUsize::new(0),
            }
        }

        fn recent(&self, limit: usize) -> Vec<T> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.rows.iter().rev().take(limit).cloned().collect()
        }
    }

    impl RecordsStore for MemoryStore<ExtractedRecord> {
        fn get_recent(&self, limit: usize) -> Result<Vec<ExtractedRecord>, DashboardError> {
            Ok(self.recent(limit))
        }
    }

    impl LogStore for MemoryStore<OperationLogEntry> {
        fn get_recent(&self, limit: usize) -> Result<Vec<OperationLogEntry>, DashboardError> {
            Ok(self.recent(limit))
        }
    }

    struct DownStore;

    impl RecordsStore for DownStore {
        fn get_recent(&self, _limit: usize) -> Result<Vec<ExtractedRecord>, DashboardError> {
            Err(DashboardError::unavailable("records store", "connection refused"))
        }
    }

    impl LogStore for DownStore {
        fn get_recent(&self, _limit: usize) -> Result<Vec<OperationLogEntry>, DashboardError> {
            Err(DashboardError::unavailable("operations log", "connection refused"))
        }
    }

    /// Ignores the limit entirely.
    struct GreedyStore;

    impl RecordsStore for GreedyStore {
        fn get_recent(&self, _limit: usize) -> Result<Vec<ExtractedRecord>, DashboardError> {
            Ok((0..50).map(|i| record(&format!("co{i}"))).collect())
        }
    }

    fn record(name: &str) -> ExtractedRecord {
        ExtractedRecord {
            company_name: name.to_string(),
            product_name: None,
            category: Some("Electronics".into()),
            subcategory: Some("Laptops".into()),
            emails: vec![format!("sales@{name}.example")],
            phones: Vec::new(),
            source_url: None,
            extracted_at: "2024-05-01T10:00:00Z".into(),
        }
    }

    fn log_entry(op: &str) -> OperationLogEntry {
        OperationLogEntry {
            operation: op.to_string(),
            level: LogLevel::Info,
            message: String::new(),
            details: None,
            created_at: "2024-05-01T10:00:00Z".into(),
        }
    }

    fn limits(records: usize, logs: usize) -> QueryLimits {
        QueryLimits {
            records: NonZeroUsize::new(records).unwrap(),
            logs: NonZeroUsize::new(logs).unwrap(),
        }
    }

    fn snapshot(processed: u64, succeeded: u64, failed: u64) -> StatsSnapshot {
        StatsSnapshot {
            processed,
            succeeded,
            failed,
            ..Default::default()
        }
    }

    #[test]
    fn summary_of_82_out_of_100() {
        let summary = build_summary(&snapshot(100, 82, 18));
        assert_eq!(summary.success_rate_percent, 82.0);
        assert_eq!(summary.processed, 100);
        assert_eq!(summary.succeeded, 82);
        assert_eq!(summary.failed, 18);
    }

    #[test]
    fn summary_with_no_runs_is_zero() {
        let summary = build_summary(&StatsSnapshot::default());
        assert_eq!(summary.success_rate_percent, 0.0);
    }

    #[test]
    fn summary_carries_sub_counts_through() {
        let snap = StatsSnapshot {
            processed: 3,
            succeeded: 1,
            failed: 1,
            companies_found: 7,
            products_found: 11,
            emails_extracted: 5,
            phones_extracted: 2,
        };
        let summary = build_summary(&snap);
        assert_eq!(summary.success_rate_percent, 33.3);
        assert_eq!(summary.companies_found, 7);
        assert_eq!(summary.products_found, 11);
        assert_eq!(summary.emails_extracted, 5);
        assert_eq!(summary.phones_extracted, 2);
    }

    #[test]
    fn malformed_counters_are_clamped() {
        let summary = build_summary(&snapshot(10, 15, 2));
        assert_eq!(summary.success_rate_percent, 100.0);
        assert_eq!(summary.succeeded, 15);
    }

    #[test]
    fn recent_records_returns_what_the_store_has() {
        let store = Arc::new(MemoryStore::new(vec![record("a"), record("b"), record("c")]));
        let facade = DashboardQueryFacade::new(
            Arc::new(RunStatistics::new()),
            store,
            Arc::new(MemoryStore::<OperationLogEntry>::new(Vec::new())),
            QueryLimits::default(),
        );
        let rows = facade.recent_records(NonZeroUsize::new(10).unwrap()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.company_name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn recent_queries_never_exceed_limit() {
        let facade = DashboardQueryFacade::new(
            Arc::new(RunStatistics::new()),
            Arc::new(GreedyStore),
            Arc::new(MemoryStore::new((0..9).map(|i| log_entry(&format!("op{i}"))).collect())),
            QueryLimits::default(),
        );
        assert_eq!(facade.recent_records(NonZeroUsize::new(4).unwrap()).unwrap().len(), 4);
        let logs = facade.recent_log_entries(NonZeroUsize::new(5).unwrap()).unwrap();
        assert_eq!(logs.len(), 5);
        assert_eq!(logs[0].operation, "op8");
    }

    #[test]
    fn empty_stores_are_not_errors() {
        let facade = DashboardQueryFacade::new(
            Arc::new(RunStatistics::new()),
            Arc::new(MemoryStore::<ExtractedRecord>::new(Vec::new())),
            Arc::new(MemoryStore::<OperationLogEntry>::new(Vec::new())),
            QueryLimits::default(),
        );
        assert!(facade.recent_records(NonZeroUsize::MIN).unwrap().is_empty());
        assert!(facade.recent_log_entries(NonZeroUsize::MIN).unwrap().is_empty());
    }

    #[tokio::test]
    async fn assemble_ready_view() {
        let stats = Arc::new(RunStatistics::from_snapshot(snapshot(100, 82, 18)));
        let records = Arc::new(MemoryStore::new(vec![record("a"), record("b"), record("c")]));
        let logs = Arc::new(MemoryStore::new(
            (0..8).map(|i| log_entry(&format!("op{i}"))).collect(),
        ));
        let facade = DashboardQueryFacade::new(stats, records.clone(), logs.clone(), limits(10, 5));

        let view = facade.assemble().await;
        let data = view.data().expect("ready view");
        assert_eq!(data.summary.success_rate_percent, 82.0);
        assert_eq!(data.recent_records.len(), 3);
        assert_eq!(data.recent_logs.len(), 5);
        assert_eq!(data.recent_logs[0].operation, "op7");
        assert_eq!(records.calls.load(Ordering::Relaxed), 1);
        assert_eq!(logs.calls.load(Ordering::Relaxed), 1);

        // Unchanged stores give the same view.
        assert_eq!(facade.assemble().await, view);
    }

    #[tokio::test]
    async fn failing_records_store_degrades() {
        let facade = DashboardQueryFacade::new(
            Arc::new(RunStatistics::from_snapshot(snapshot(100, 82, 18))),
            Arc::new(DownStore),
            Arc::new(MemoryStore::new(vec![log_entry("crawl_category")])),
            QueryLimits::default(),
        );
        let view = facade.assemble().await;
        let err = view.error().expect("degraded view");
        assert!(err.starts_with("Error loading dashboard:"), "{err}");
        assert!(err.contains("records store"), "{err}");
        assert!(view.data().is_none());
    }

    #[tokio::test]
    async fn failing_log_store_degrades() {
        let facade = DashboardQueryFacade::new(
            Arc::new(RunStatistics::new()),
            Arc::new(MemoryStore::new(vec![record("a")])),
            Arc::new(DownStore),
            QueryLimits::default(),
        );
        let err = facade.assemble().await.error().map(str::to_owned).unwrap();
        assert!(err.contains("operations log"), "{err}");
    }

    #[tokio::test]
    async fn failing_stats_source_degrades() {
        struct BrokenStats;
        impl StatsSource for BrokenStats {
            fn snapshot(&self) -> Result<StatsSnapshot, DashboardError> {
                Err(DashboardError::unavailable("statistics file", "permission denied"))
            }
        }

        let facade = DashboardQueryFacade::new(
            Arc::new(BrokenStats),
            Arc::new(MemoryStore::<ExtractedRecord>::new(Vec::new())),
            Arc::new(MemoryStore::<OperationLogEntry>::new(Vec::new())),
            QueryLimits::default(),
        );
        assert_eq!(
            facade.assemble().await.error(),
            Some("Error loading dashboard: statistics file is unavailable: permission denied")
        );
    }

    #[tokio::test]
    async fn statistics_read_runs_off_the_runtime_thread_and_stores_still_finish() {
        struct ThreadCheckingStats {
            runtime_thread: std::thread::ThreadId,
        }
        impl StatsSource for ThreadCheckingStats {
            fn snapshot(&self) -> Result<StatsSnapshot, DashboardError> {
                assert_ne!(std::thread::current().id(), self.runtime_thread);
                Err(DashboardError::unavailable("statistics file", "permission denied"))
            }
        }

        let records = Arc::new(MemoryStore::new(vec![record("a")]));
        let logs = Arc::new(MemoryStore::new(vec![log_entry("crawl_category")]));
        let facade = DashboardQueryFacade::new(
            Arc::new(ThreadCheckingStats {
                runtime_thread: std::thread::current().id(),
            }),
            records.clone(),
            logs.clone(),
            QueryLimits::default(),
        );

        let err = facade.assemble().await.error().map(str::to_owned).unwrap();
        assert!(err.contains("statistics file"), "{err}");
        assert_eq!(records.calls.load(Ordering::Relaxed), 1);
        assert_eq!(logs.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn default_limits() {
        let limits = QueryLimits::default();
        assert_eq!(limits.records.get(), 10);
        assert_eq!(limits.logs.get(), 5);
    }

    #[tokio::test]
    async fn panicking_store_degrades() {
        struct PanicStore;
        impl RecordsStore for PanicStore {
            fn get_recent(&self, _limit: usize) -> Result<Vec<ExtractedRecord>, DashboardError> {
                panic!("store crashed")
            }
        }

        let facade = DashboardQueryFacade::new(
            Arc::new(RunStatistics::new()),
            Arc::new(PanicStore),
            Arc::new(MemoryStore::<OperationLogEntry>::new(Vec::new())),
            QueryLimits::default(),
        );
        assert!(facade.assemble().await.error().is_some());
    }
}
