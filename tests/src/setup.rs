//! Common test setup functions.

use std::collections::BTreeMap;
use std::sync::Arc;

use ingest::Importer;
use stats_core::{DimensionKind, InstanceMonthlyReport, Result, YearMonth};
use stats_store::dimensions::load_names;
use stats_store::instances::{count_reports, fetch_report};
use stats_store::StatsDb;
use telemetry::ImportMetrics;
use tempfile::TempDir;

/// In-memory store, an importer over it, and a scratch directory for daily files.
pub struct TestContext {
    pub db: StatsDb,
    pub metrics: Arc<ImportMetrics>,
    pub importer: Importer,
    pub dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = StatsDb::in_memory()
            .await
            .expect("Failed to open in-memory store");
        let metrics = Arc::new(ImportMetrics::new());
        let importer = Importer::with_metrics(db.clone(), metrics.clone());
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        Self {
            db,
            metrics,
            importer,
            dir,
        }
    }

    pub async fn report(&self, instance_id: &str, month: YearMonth) -> Option<InstanceMonthlyReport> {
        fetch_report(self.db.pool(), instance_id, month)
            .await
            .expect("Failed to fetch report")
    }

    pub async fn row_count(&self) -> Result<i64> {
        count_reports(self.db.pool()).await
    }

    /// A row's job counts keyed by job type name.
    pub async fn job_counts(&self, report: &InstanceMonthlyReport) -> BTreeMap<String, u64> {
        let names = load_names(self.db.pool(), DimensionKind::JobType)
            .await
            .expect("Failed to load job types");
        report
            .jobs
            .iter()
            .map(|(id, count)| (names[id].clone(), *count))
            .collect()
    }
}
