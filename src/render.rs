//! JSON report artifacts.
//!
//! Single-month reports describe the last complete month (the one before
//! `current`); trend reports cover every month except `current`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use stats_core::YearMonth;
use stats_store::StatsDb;
use tracing::{info, warn};

/// Subdirectory holding one trend file per plugin.
const PLUGIN_DIR: &str = "plugins";

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let path = dir.join(name);
    let body = serde_json::to_vec_pretty(value)
        .with_context(|| format!("Failed to serialize {name}"))?;
    fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Plugin names become file names; anything that could escape the
/// output directory is refused.
fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}

/// Computes every report and writes it under `dir`.
pub async fn render_all(db: &StatsDb, dir: &Path, current: YearMonth) -> Result<()> {
    let month = current.previous();
    fs::create_dir_all(dir.join(PLUGIN_DIR))
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let installations = reports::installations(db, month)
        .await
        .context("installations report")?;
    write_json(dir, "installations.json", &installations)?;

    let capabilities = reports::capabilities(db, month)
        .await
        .context("capabilities report")?;
    write_json(dir, "capabilities.json", &capabilities)?;

    let latest = reports::latest_plugin_numbers(db, month)
        .await
        .context("latest plugin numbers report")?;
    write_json(dir, "latestNumbers.json", &latest)?;

    let jvms = reports::jvm_report(db, current)
        .await
        .context("jvm report")?;
    write_json(dir, "jvms.json", &jvms)?;

    let jobs = reports::job_totals(db, month)
        .await
        .context("job type totals")?;
    write_json(dir, "jobtypes.json", &jobs)?;

    let nodes = reports::os_totals(db, month)
        .await
        .context("node totals")?;
    write_json(dir, "nodes.json", &nodes)?;

    let executors = reports::executor_totals(db, month)
        .await
        .context("executor totals")?;
    write_json(dir, "executors.json", &executors)?;

    let plugin_versions = reports::jenkins_versions_for_plugin_versions(db, month)
        .await
        .context("plugin versions report")?;
    write_json(dir, "pluginversions.json", &plugin_versions.by_jenkins_version())?;

    let plugin_reports = reports::plugin_reports(db, current)
        .await
        .context("plugin trend reports")?;
    let plugin_dir = dir.join(PLUGIN_DIR);
    let mut written = 0usize;
    for report in &plugin_reports {
        if !is_safe_file_stem(&report.name) {
            warn!(plugin = %report.name, "Skipping plugin with unusable file name");
            continue;
        }
        write_json(&plugin_dir, &format!("{}.json", report.name), report)?;
        written += 1;
    }

    info!(month = %month, plugin_files = written, "Wrote report files");
    Ok(())
}
