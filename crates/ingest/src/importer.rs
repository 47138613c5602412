//! Daily file importer.
//!
//! Walks a directory of `*.gz` daily files in date order and folds each file
//! into the store inside one transaction. The registry mark is written in the
//! same transaction, so a file is either fully ingested or not at all.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;
use stats_core::{Error, InputErrorCode, Result, Snapshot};
use stats_store::registry::{is_file_imported, mark_file_imported};
use stats_store::{db_error, SqliteConnection, StatsDb};
use telemetry::ImportMetrics;
use tracing::{info, warn};

use crate::engine::{IngestOutcome, IngestionEngine};
use crate::normalizer::{decode_daily_file, DecodedFile};

/// Daily files carry their date as `<name>.YYYYMMDD.gz`.
static FILE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\d{8})\.gz$").expect("valid regex"));

/// Per-file ingestion tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub snapshots: u64,
    pub inserted: u64,
    pub updated: u64,
    pub counts_advanced: u64,
    pub skipped: u64,
    pub tolerated_decode_skips: u64,
}

impl FileSummary {
    fn record(&mut self, outcome: IngestOutcome) {
        self.snapshots += 1;
        match outcome {
            IngestOutcome::Inserted => self.inserted += 1,
            IngestOutcome::Updated => self.updated += 1,
            IngestOutcome::CountAdvanced => self.counts_advanced += 1,
            IngestOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Result of a directory import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files_imported: u64,
    /// Files already present in the registry
    pub files_skipped: u64,
    pub snapshots_seen: u64,
    pub inserted: u64,
    pub updated: u64,
    pub counts_advanced: u64,
    pub skipped: u64,
    pub tolerated_decode_skips: u64,
}

impl ImportSummary {
    fn add(&mut self, file: &FileSummary) {
        self.files_imported += 1;
        self.snapshots_seen += file.snapshots;
        self.inserted += file.inserted;
        self.updated += file.updated;
        self.counts_advanced += file.counts_advanced;
        self.skipped += file.skipped;
        self.tolerated_decode_skips += file.tolerated_decode_skips;
    }
}

/// Outcome of importing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Imported(FileSummary),
    AlreadyImported,
}

/// Date embedded in a daily filename, as `YYYYMMDD`.
pub fn file_date(filename: &str) -> Option<u32> {
    FILE_DATE
        .captures(filename)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lists the `*.gz` files of a directory in import order: dated files by
/// date, then undated files by name.
pub fn daily_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::input(
            InputErrorCode::UnreadableFile,
            format!("cannot list {}: {e}", dir.display()),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "gz") {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| {
        let name = file_name(path);
        let date = file_date(&name);
        (date.is_none(), date, name)
    });
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Drives daily files through the ingestion engine.
pub struct Importer {
    db: StatsDb,
    engine: IngestionEngine,
    metrics: Arc<ImportMetrics>,
}

impl Importer {
    pub fn new(db: StatsDb) -> Self {
        Self::with_metrics(db, Arc::new(ImportMetrics::new()))
    }

    pub fn with_metrics(db: StatsDb, metrics: Arc<ImportMetrics>) -> Self {
        Self {
            db,
            engine: IngestionEngine::with_metrics(metrics.clone()),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<ImportMetrics> {
        &self.metrics
    }

    /// Imports every not-yet-imported daily file of `dir`, oldest first.
    ///
    /// Stops at the first failing file; files committed before it stay committed.
    pub async fn import_directory(&mut self, dir: &Path) -> Result<ImportSummary> {
        let files = daily_files(dir)?;
        info!(dir = %dir.display(), files = files.len(), "Starting import");

        let mut summary = ImportSummary::default();
        for path in files {
            match self.import_file(&path).await? {
                FileOutcome::Imported(file) => summary.add(&file),
                FileOutcome::AlreadyImported => summary.files_skipped += 1,
            }
        }

        info!(
            imported = summary.files_imported,
            skipped = summary.files_skipped,
            snapshots = summary.snapshots_seen,
            "Import finished"
        );
        Ok(summary)
    }

    /// Imports one daily file unless the registry already has it.
    pub async fn import_file(&mut self, path: &Path) -> Result<FileOutcome> {
        let filename = file_name(path);
        if is_file_imported(self.db.pool(), &filename).await? {
            self.metrics.files_skipped.inc();
            info!(file = %filename, "Already imported, skipping");
            return Ok(FileOutcome::AlreadyImported);
        }

        let started = Instant::now();
        let owned = path.to_path_buf();
        let decoded = tokio::task::spawn_blocking(move || decode_daily_file(&owned))
            .await
            .map_err(|e| Error::internal(format!("decode task failed: {e}")))??;

        let summary = self.import_decoded(&filename, decoded).await?;

        let elapsed = started.elapsed();
        self.metrics
            .file_latency_ms
            .observe(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        info!(
            file = %filename,
            snapshots = summary.snapshots,
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            latency_ms = %elapsed.as_millis(),
            "Imported daily file"
        );
        Ok(FileOutcome::Imported(summary))
    }

    /// Folds already-decoded snapshots in and marks `filename` as imported,
    /// all in one transaction.
    pub async fn import_snapshots(
        &mut self,
        filename: &str,
        snapshots: &[Snapshot],
    ) -> Result<FileSummary> {
        let mut tx = self.db.begin().await?;

        let folded = self.fold(&mut tx, filename, snapshots).await;
        let committed = match folded {
            Ok(summary) => tx
                .commit()
                .await
                .map(|_| summary)
                .map_err(|e| db_error(e, "commit daily file")),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(file = %filename, error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        };

        if committed.is_err() {
            // Ids created inside the rolled-back transaction are gone.
            self.engine.reset_cache();
        }
        committed
    }

    async fn import_decoded(&mut self, filename: &str, decoded: DecodedFile) -> Result<FileSummary> {
        self.metrics.tolerated_decode_skips.inc_by(decoded.tolerated);
        let mut summary = self.import_snapshots(filename, &decoded.snapshots).await?;
        summary.tolerated_decode_skips = decoded.tolerated;
        self.metrics.files_imported.inc();
        Ok(summary)
    }

    async fn fold(
        &mut self,
        conn: &mut SqliteConnection,
        filename: &str,
        snapshots: &[Snapshot],
    ) -> Result<FileSummary> {
        let mut summary = FileSummary::default();
        for snapshot in snapshots {
            self.metrics.snapshots_seen.inc();
            let outcome = self.engine.ingest(conn, snapshot).await?;
            summary.record(outcome);
        }
        mark_file_imported(&mut *conn, filename).await?;
        Ok(summary)
    }
}
