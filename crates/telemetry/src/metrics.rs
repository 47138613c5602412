//! Import metrics.
//!
//! Collected in-memory for one importer run and summarized through tracing
//! when the run ends. Nothing here affects ingestion behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cumulative wall-clock time spent in one kind of operation.
#[derive(Debug, Default)]
pub struct Timer {
    nanos: AtomicU64,
    count: AtomicU64,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Starts timing; the elapsed time is recorded when the guard drops.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            started: Instant::now(),
        }
    }

    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Records into its `Timer` on drop.
pub struct TimerGuard<'a> {
    timer: &'a Timer,
    started: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.started.elapsed());
    }
}

/// Histogram for per-file latency.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 10ms, 50ms, 100ms, 500ms, 1s, 5s, 10s, 30s, 1m, 5m, 10m
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [
        10, 50, 100, 500, 1_000, 5_000, 10_000, 30_000, 60_000, 300_000, 600_000,
    ];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns (upper bound ms, count) per bucket.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Metrics for one importer run.
#[derive(Debug, Default)]
pub struct ImportMetrics {
    // Files
    pub files_imported: Counter,
    pub files_skipped: Counter,

    // Snapshots
    pub snapshots_seen: Counter,
    pub reports_inserted: Counter,
    pub reports_updated: Counter,
    pub counts_advanced: Counter,
    pub tolerated_decode_skips: Counter,

    // Data-quality discards
    pub skipped_instance_id: Counter,
    pub skipped_jenkins_version: Counter,
    pub skipped_not_newer: Counter,
    pub skipped_no_jobs: Counter,

    // Dimension interning
    pub dimension_cache_hits: Counter,
    pub dimension_rows_created: Counter,
    pub resolve_jvm_version: Timer,
    pub resolve_os_type: Timer,
    pub resolve_job_type: Timer,
    pub resolve_jenkins_version: Timer,
    pub resolve_plugin: Timer,

    // Fact rows
    pub report_lookup: Timer,
    pub report_insert: Timer,
    pub report_update: Timer,

    pub file_latency_ms: Histogram,
}

impl ImportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total data-quality discards.
    pub fn skipped_total(&self) -> u64 {
        self.skipped_instance_id.get()
            + self.skipped_jenkins_version.get()
            + self.skipped_not_newer.get()
            + self.skipped_no_jobs.get()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> ImportMetricsSnapshot {
        let ms = |t: &Timer| t.total().as_secs_f64() * 1000.0;
        ImportMetricsSnapshot {
            timestamp: Utc::now(),
            files_imported: self.files_imported.get(),
            files_skipped: self.files_skipped.get(),
            snapshots_seen: self.snapshots_seen.get(),
            reports_inserted: self.reports_inserted.get(),
            reports_updated: self.reports_updated.get(),
            counts_advanced: self.counts_advanced.get(),
            tolerated_decode_skips: self.tolerated_decode_skips.get(),
            skipped_instance_id: self.skipped_instance_id.get(),
            skipped_jenkins_version: self.skipped_jenkins_version.get(),
            skipped_not_newer: self.skipped_not_newer.get(),
            skipped_no_jobs: self.skipped_no_jobs.get(),
            dimension_cache_hits: self.dimension_cache_hits.get(),
            dimension_rows_created: self.dimension_rows_created.get(),
            resolve_jvm_version_ms: ms(&self.resolve_jvm_version),
            resolve_os_type_ms: ms(&self.resolve_os_type),
            resolve_job_type_ms: ms(&self.resolve_job_type),
            resolve_jenkins_version_ms: ms(&self.resolve_jenkins_version),
            resolve_plugin_ms: ms(&self.resolve_plugin),
            report_lookup_ms: ms(&self.report_lookup),
            report_insert_ms: ms(&self.report_insert),
            report_update_ms: ms(&self.report_update),
            file_latency_mean_ms: self.file_latency_ms.mean(),
        }
    }

    /// Logs the run summary at info level.
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            files_imported = s.files_imported,
            files_skipped = s.files_skipped,
            snapshots_seen = s.snapshots_seen,
            inserted = s.reports_inserted,
            updated = s.reports_updated,
            counts_advanced = s.counts_advanced,
            tolerated_decode_skips = s.tolerated_decode_skips,
            "Import run finished"
        );
        info!(
            instance_id = s.skipped_instance_id,
            jenkins_version = s.skipped_jenkins_version,
            not_newer = s.skipped_not_newer,
            no_jobs = s.skipped_no_jobs,
            "Snapshots discarded"
        );
        info!(
            cache_hits = s.dimension_cache_hits,
            rows_created = s.dimension_rows_created,
            jvm_version_ms = s.resolve_jvm_version_ms,
            os_type_ms = s.resolve_os_type_ms,
            job_type_ms = s.resolve_job_type_ms,
            jenkins_version_ms = s.resolve_jenkins_version_ms,
            plugin_ms = s.resolve_plugin_ms,
            "Dimension resolution"
        );
        info!(
            lookup_ms = s.report_lookup_ms,
            insert_ms = s.report_insert_ms,
            update_ms = s.report_update_ms,
            file_latency_mean_ms = s.file_latency_mean_ms,
            "Fact table writes"
        );
    }
}

/// A snapshot of import metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportMetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub files_imported: u64,
    pub files_skipped: u64,
    pub snapshots_seen: u64,
    pub reports_inserted: u64,
    pub reports_updated: u64,
    pub counts_advanced: u64,
    pub tolerated_decode_skips: u64,
    pub skipped_instance_id: u64,
    pub skipped_jenkins_version: u64,
    pub skipped_not_newer: u64,
    pub skipped_no_jobs: u64,
    pub dimension_cache_hits: u64,
    pub dimension_rows_created: u64,
    pub resolve_jvm_version_ms: f64,
    pub resolve_os_type_ms: f64,
    pub resolve_job_type_ms: f64,
    pub resolve_jenkins_version_ms: f64,
    pub resolve_plugin_ms: f64,
    pub report_lookup_ms: f64,
    pub report_insert_ms: f64,
    pub report_update_ms: f64,
    pub file_latency_mean_ms: f64,
}
