//! Installation counts and the capability curve.

use stats_core::{Result, YearMonth};
use stats_store::query::installation_counts;
use stats_store::StatsDb;
use tracing::debug;

use crate::model::{to_count, CapabilitiesReport, InstallationReport};

/// Eligible instances per release Jenkins version for one month.
pub async fn installations(db: &StatsDb, month: YearMonth) -> Result<InstallationReport> {
    let rows = installation_counts(db.pool(), month).await?;
    debug!(month = %month, versions = rows.len(), "Computed installation counts");

    Ok(InstallationReport {
        installations: rows
            .into_iter()
            .map(|(version, count)| (version, to_count(count)))
            .collect(),
    })
}

/// Instances able to run at least each version: walking versions from the
/// highest down, every bucket holds its own count plus all buckets above it.
pub async fn capabilities(db: &StatsDb, month: YearMonth) -> Result<CapabilitiesReport> {
    let mut rows = installation_counts(db.pool(), month).await?;
    rows.sort_by(|a, b| b.0.cmp(&a.0));

    let mut report = CapabilitiesReport::default();
    let mut running = 0u64;
    for (version, count) in rows {
        running += to_count(count);
        report.installations.insert(version, running);
    }

    debug!(month = %month, total = running, "Computed capability curve");
    Ok(report)
}
