//! Monthly JVM distribution.

use stats_core::jvm::is_reportable_jvm;
use stats_core::{DimensionKind, Result, YearMonth};
use stats_store::query::jvm_counts_by_month;
use stats_store::StatsDb;
use tracing::debug;

use crate::lookup::NameLookup;
use crate::model::{to_count, JvmReport};

const JENKINS_2X_PREFIX: &str = "2.";

/// Eligible instances per month and JVM label, for every month except
/// `current`. Months without any reportable JVM get no entry.
pub async fn jvm_report(db: &StatsDb, current: YearMonth) -> Result<JvmReport> {
    let jvms = NameLookup::load(db, DimensionKind::JvmVersion).await?;
    let cores = NameLookup::load(db, DimensionKind::JenkinsVersion).await?;

    let mut report = JvmReport::default();
    for (year, month, jvm_id, jenkins_id, count) in jvm_counts_by_month(db.pool(), current).await? {
        let Some(jvm) = jvms.get(jvm_id).filter(|name| is_reportable_jvm(name)) else {
            continue;
        };
        let key = YearMonth { year, month }.key();
        let count = to_count(count);

        *report
            .per_month
            .entry(key.clone())
            .or_default()
            .entry(jvm.to_string())
            .or_default() += count;

        if cores
            .get(jenkins_id)
            .is_some_and(|v| v.starts_with(JENKINS_2X_PREFIX))
        {
            *report
                .per_month_2x
                .entry(key)
                .or_default()
                .entry(jvm.to_string())
                .or_default() += count;
        }
    }

    debug!(current = %current, months = report.per_month.len(), "Computed JVM report");
    Ok(report)
}
