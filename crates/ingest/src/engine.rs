//! Ingestion engine: folds one snapshot at a time into the monthly fact table.
//!
//! Per snapshot:
//! 1. Pre-filter (instance id / Jenkins version); discards are counted, not errors
//! 2. Look up the stored row for (instance, year, month)
//! 3. Not newer than the stored `report_time`: discard, but advance a count of 1 to 2
//! 4. Otherwise build the row content; no visible jobs discards the snapshot
//! 5. Insert or update in place

use std::collections::BTreeMap;
use std::sync::Arc;

use stats_core::jvm::canonical_jvm_version;
use stats_core::limits::{
    EXECUTORS_SENTINEL, MISSING_JVM_VERSION, PLACEHOLDER_PLUGIN_VERSION, PRIVATE_JOB_PREFIX,
};
use stats_core::{
    DimensionKind, ExistingReport, InstanceMonthlyReport, Result, SkipReason, Snapshot, YearMonth,
};
use stats_store::instances::{find_existing, insert_report, set_count_for_month, update_report};
use stats_store::SqliteConnection;
use telemetry::ImportMetrics;
use tracing::debug;

use crate::interner::Interner;

/// What happened to one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new fact row was written.
    Inserted,
    /// An existing fact row was replaced with newer content.
    Updated,
    /// The snapshot was not newer, but it was the second one seen this month
    /// so the stored counter was advanced.
    CountAdvanced,
    /// The snapshot was discarded without a write.
    Skipped(SkipReason),
}

/// Single-threaded snapshot folder.
#[derive(Default)]
pub struct IngestionEngine {
    interner: Interner,
    metrics: Option<Arc<ImportMetrics>>,
}

impl IngestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<ImportMetrics>) -> Self {
        Self {
            interner: Interner::with_metrics(metrics.clone()),
            metrics: Some(metrics),
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Forgets cached dimension ids, e.g. after a rolled-back transaction.
    pub fn reset_cache(&mut self) {
        self.interner.clear();
    }

    /// Folds one snapshot into the fact table.
    ///
    /// An unparseable timestamp is an `INPUT_001` error; storage failures
    /// propagate. Both are fatal for the containing file.
    pub async fn ingest(
        &mut self,
        conn: &mut SqliteConnection,
        snapshot: &Snapshot,
    ) -> Result<IngestOutcome> {
        if let Some(reason) = snapshot.pre_filter() {
            return Ok(self.skip(snapshot, reason));
        }

        let report_time = snapshot.parsed_timestamp()?;
        let month = YearMonth::of(report_time);

        let existing = {
            let _timer = self.metrics.as_deref().map(|m| m.report_lookup.start());
            find_existing(&mut *conn, &snapshot.install_id, month).await?
        };
        let previous_count = existing.map_or(0, |e| e.count_for_month);
        let count_for_month = previous_count + 1;

        if let Some(prev) = existing {
            if report_time <= prev.report_time {
                if prev.count_for_month == 1 {
                    set_count_for_month(&mut *conn, prev.id, count_for_month).await?;
                    if let Some(m) = self.metrics.as_deref() {
                        m.counts_advanced.inc();
                    }
                    debug!(
                        install = %snapshot.install_id,
                        month = %month,
                        "Duplicate snapshot advanced count_for_month"
                    );
                    return Ok(IngestOutcome::CountAdvanced);
                }
                return Ok(self.skip(snapshot, SkipReason::NotNewer));
            }
        }

        let Some(report) = self
            .build_report(conn, snapshot, month, report_time, count_for_month)
            .await?
        else {
            return Ok(self.skip(snapshot, SkipReason::NoJobs));
        };

        self.write(conn, existing, &report).await
    }

    async fn build_report(
        &mut self,
        conn: &mut SqliteConnection,
        snapshot: &Snapshot,
        month: YearMonth,
        report_time: chrono::DateTime<chrono::Utc>,
        count_for_month: i64,
    ) -> Result<Option<InstanceMonthlyReport>> {
        let jvm = snapshot
            .controller()
            .map(|node| canonical_jvm_version(&node.jvm_version))
            .unwrap_or_else(|| MISSING_JVM_VERSION.to_string());
        let jvm_version_id = self
            .interner
            .resolve(conn, DimensionKind::JvmVersion, &jvm)
            .await?;

        let mut executors = 0u64;
        let mut nodes = BTreeMap::new();
        for node in &snapshot.nodes {
            if node.executors != EXECUTORS_SENTINEL {
                executors = executors.saturating_add(node.executors);
            }
            let os_id = self
                .interner
                .resolve(conn, DimensionKind::OsType, &node.os)
                .await?;
            *nodes.entry(os_id).or_insert(0u64) += 1;
        }

        let mut plugins = Vec::with_capacity(snapshot.plugins.len());
        for plugin in &snapshot.plugins {
            if plugin.version == PLACEHOLDER_PLUGIN_VERSION {
                continue;
            }
            plugins.push(
                self.interner
                    .resolve_plugin(conn, &plugin.name, &plugin.version)
                    .await?,
            );
        }

        let mut jobs = BTreeMap::new();
        for (job_type, &count) in &snapshot.jobs {
            if count == 0 || job_type.starts_with(PRIVATE_JOB_PREFIX) {
                continue;
            }
            let job_id = self
                .interner
                .resolve(conn, DimensionKind::JobType, job_type)
                .await?;
            jobs.insert(job_id, count);
        }
        // zero counts were never inserted, so an empty map means no visible jobs
        if jobs.is_empty() {
            return Ok(None);
        }

        let jenkins_version_id = self
            .interner
            .resolve(conn, DimensionKind::JenkinsVersion, &snapshot.version)
            .await?;

        Ok(Some(InstanceMonthlyReport {
            instance_id: snapshot.install_id.clone(),
            month,
            report_time,
            count_for_month,
            jenkins_version_id,
            jvm_version_id,
            executors,
            plugins,
            jobs,
            nodes,
        }))
    }

    async fn write(
        &self,
        conn: &mut SqliteConnection,
        existing: Option<ExistingReport>,
        report: &InstanceMonthlyReport,
    ) -> Result<IngestOutcome> {
        match existing {
            None => {
                let _timer = self.metrics.as_deref().map(|m| m.report_insert.start());
                insert_report(&mut *conn, report).await?;
                if let Some(m) = self.metrics.as_deref() {
                    m.reports_inserted.inc();
                }
                Ok(IngestOutcome::Inserted)
            }
            Some(prev) => {
                let _timer = self.metrics.as_deref().map(|m| m.report_update.start());
                update_report(&mut *conn, prev.id, report).await?;
                if let Some(m) = self.metrics.as_deref() {
                    m.reports_updated.inc();
                }
                Ok(IngestOutcome::Updated)
            }
        }
    }

    fn skip(&self, snapshot: &Snapshot, reason: SkipReason) -> IngestOutcome {
        if let Some(m) = self.metrics.as_deref() {
            let counter = match reason {
                SkipReason::InstanceId => &m.skipped_instance_id,
                SkipReason::JenkinsVersion => &m.skipped_jenkins_version,
                SkipReason::NotNewer => &m.skipped_not_newer,
                SkipReason::NoJobs => &m.skipped_no_jobs,
            };
            counter.inc();
        }
        debug!(
            install = %snapshot.install_id,
            version = %snapshot.version,
            reason = reason.as_str(),
            "Discarded snapshot"
        );
        IngestOutcome::Skipped(reason)
    }
}
