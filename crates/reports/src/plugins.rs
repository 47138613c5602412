//! Plugin adoption reports.
//!
//! All three reports resolve plugin ids through one bulk [`PluginLookup`]
//! and fold grouped query rows into per-name buckets in memory, so the number
//! of queries does not grow with the number of plugins.

use std::collections::{BTreeMap, HashMap};

use stats_core::{Result, YearMonth};
use stats_store::query::{
    eligible_totals_by_month, max_version_per_instance, plugin_counts, plugin_counts_by_month,
    plugin_instance_counts,
};
use stats_store::StatsDb;
use tracing::{debug, warn};

use crate::lookup::PluginLookup;
use crate::model::{
    percentage, to_count, LatestPluginNumbers, PluginReport, PluginVersionInstances,
    PluginVersionsReport,
};

/// Eligible plugin references for one month, rolled up by plugin name.
pub async fn latest_plugin_numbers(db: &StatsDb, month: YearMonth) -> Result<LatestPluginNumbers> {
    let lookup = PluginLookup::load(db).await?;
    let rows = plugin_counts(db.pool(), month).await?;

    let mut report = LatestPluginNumbers {
        month: month.start().timestamp(),
        ..Default::default()
    };
    for (plugin_id, count) in rows {
        let Some(plugin) = lookup.get(plugin_id) else {
            warn!(plugin_id, "Plugin id missing from dimension table");
            continue;
        };
        *report.plugins.entry(plugin.name.clone()).or_default() += to_count(count);
    }

    debug!(month = %month, plugins = report.plugins.len(), "Computed latest plugin numbers");
    Ok(report)
}

/// One trend report per plugin name.
///
/// The monthly series covers every month except `current`, which is assumed
/// incomplete; the per-version series covers the month before `current`.
/// Percentages are relative to the month's eligible row count.
pub async fn plugin_reports(db: &StatsDb, current: YearMonth) -> Result<Vec<PluginReport>> {
    let lookup = PluginLookup::load(db).await?;
    let previous = current.previous();

    let totals: HashMap<String, u64> = eligible_totals_by_month(db.pool())
        .await?
        .into_iter()
        .map(|(year, month, count)| (YearMonth { year, month }.key(), to_count(count)))
        .collect();

    let mut reports: BTreeMap<&str, PluginReport> = lookup
        .names()
        .into_iter()
        .map(|name| {
            let report = PluginReport {
                name: name.to_string(),
                ..Default::default()
            };
            (name, report)
        })
        .collect();

    let rows = plugin_counts_by_month(db.pool(), current).await?;
    let row_count = rows.len();
    for (year, month, plugin_id, count) in rows {
        let month = YearMonth { year, month };
        let Some(plugin) = lookup.get(plugin_id) else {
            warn!(plugin_id, "Plugin id missing from dimension table");
            continue;
        };
        let Some(report) = reports.get_mut(plugin.name.as_str()) else {
            continue;
        };
        let count = to_count(count);

        *report.installations.entry(month.key()).or_default() += count;
        if month == previous {
            *report
                .installations_per_version
                .entry(plugin.version.clone())
                .or_default() += count;
        }
    }

    let previous_total = totals.get(&previous.key()).copied().unwrap_or(0);
    for report in reports.values_mut() {
        for (key, &count) in &report.installations {
            let total = totals.get(key).copied().unwrap_or(0);
            report
                .installations_percentages
                .insert(key.clone(), percentage(count, total));
        }
        for (version, &count) in &report.installations_per_version {
            report
                .installations_percentage_per_version
                .insert(version.clone(), percentage(count, previous_total));
        }
    }

    debug!(
        current = %current,
        plugins = reports.len(),
        grouped_rows = row_count,
        "Computed plugin trend reports"
    );
    Ok(reports.into_values().collect())
}

/// For one month: plugin name -> plugin version -> instance id -> references,
/// counting only instances with a known maximum release Jenkins version.
pub async fn jenkins_versions_for_plugin_versions(
    db: &StatsDb,
    month: YearMonth,
) -> Result<PluginVersionsReport> {
    let lookup = PluginLookup::load(db).await?;
    let max_versions: BTreeMap<String, String> =
        max_version_per_instance(db.pool(), month).await?.into_iter().collect();

    let mut plugins = PluginVersionInstances::new();
    for (plugin_id, instance_id, count) in plugin_instance_counts(db.pool(), month).await? {
        if !max_versions.contains_key(&instance_id) {
            continue;
        }
        let Some(plugin) = lookup.get(plugin_id) else {
            warn!(plugin_id, "Plugin id missing from dimension table");
            continue;
        };
        *plugins
            .entry(plugin.name.clone())
            .or_default()
            .entry(plugin.version.clone())
            .or_default()
            .entry(instance_id)
            .or_default() += to_count(count);
    }

    debug!(
        month = %month,
        plugins = plugins.len(),
        instances = max_versions.len(),
        "Computed jenkins versions per plugin version"
    );
    Ok(PluginVersionsReport {
        plugins,
        max_versions,
    })
}
