//! Per-month totals over job types, node operating systems and executors.

use stats_core::{DimensionId, DimensionKind, Result, YearMonth};
use stats_store::query::{executor_totals as executor_sums, job_totals as job_sums, node_totals};
use stats_store::StatsDb;
use tracing::{debug, warn};

use crate::lookup::NameLookup;
use crate::model::{to_count, Counts};

async fn named_totals(
    db: &StatsDb,
    kind: DimensionKind,
    rows: Vec<(DimensionId, i64)>,
) -> Result<Counts> {
    let names = NameLookup::load(db, kind).await?;
    let mut totals = Counts::new();
    for (id, total) in rows {
        let Some(name) = names.get(id) else {
            warn!(kind = %kind, id, "Dimension id missing from lookup");
            continue;
        };
        *totals.entry(name.to_string()).or_default() += to_count(total);
    }
    Ok(totals)
}

/// Summed job counts per job type.
pub async fn job_totals(db: &StatsDb, month: YearMonth) -> Result<Counts> {
    let rows = job_sums(db.pool(), month).await?;
    let totals = named_totals(db, DimensionKind::JobType, rows).await?;
    debug!(month = %month, job_types = totals.len(), "Computed job type totals");
    Ok(totals)
}

/// Summed node counts per operating system.
pub async fn os_totals(db: &StatsDb, month: YearMonth) -> Result<Counts> {
    let rows = node_totals(db.pool(), month).await?;
    let totals = named_totals(db, DimensionKind::OsType, rows).await?;
    debug!(month = %month, os_types = totals.len(), "Computed node totals");
    Ok(totals)
}

/// Summed executors per Jenkins version.
pub async fn executor_totals(db: &StatsDb, month: YearMonth) -> Result<Counts> {
    let totals: Counts = executor_sums(db.pool(), month)
        .await?
        .into_iter()
        .map(|(version, total)| (version, to_count(total)))
        .collect();
    debug!(month = %month, versions = totals.len(), "Computed executor totals");
    Ok(totals)
}
