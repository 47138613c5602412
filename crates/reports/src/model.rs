//! Report value types.
//!
//! Field names follow the published JSON artifacts. Month keys are the Unix
//! timestamp (seconds) of the month's first instant, as a string.

use std::collections::BTreeMap;

use serde::Serialize;

/// Count per string key (version, job type, OS name, month key).
pub type Counts = BTreeMap<String, u64>;

/// Percentage per string key. Non-finite values serialize as `null`.
pub type Percentages = BTreeMap<String, f64>;

/// Plugin name -> plugin version -> instance id -> reference count.
pub type PluginVersionInstances = BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstallationReport {
    pub installations: Counts,
}

/// Same shape as [`InstallationReport`], but each version's value counts
/// instances on that version or any higher one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilitiesReport {
    pub installations: Counts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestPluginNumbers {
    pub month: i64,
    pub plugins: Counts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginReport {
    pub name: String,
    pub installations: Counts,
    pub installations_percentages: Percentages,
    pub installations_per_version: Counts,
    pub installations_percentage_per_version: Percentages,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JvmReport {
    /// Month key -> JVM name -> eligible instances.
    #[serde(rename = "jvmStatsPerMonth")]
    pub per_month: BTreeMap<String, Counts>,
    /// Same, restricted to Jenkins 2.x.
    #[serde(rename = "jvmStatsPerMonth_2.x")]
    pub per_month_2x: BTreeMap<String, Counts>,
}

/// Plugin versions attributed to the instances running them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginVersionsReport {
    pub plugins: PluginVersionInstances,
    /// Instance id -> highest release Jenkins version that month
    pub max_versions: BTreeMap<String, String>,
}

impl PluginVersionsReport {
    /// Plugin name -> plugin version -> Jenkins version -> instances.
    pub fn by_jenkins_version(&self) -> BTreeMap<String, BTreeMap<String, Counts>> {
        let mut out: BTreeMap<String, BTreeMap<String, Counts>> = BTreeMap::new();
        for (name, versions) in &self.plugins {
            for (version, instances) in versions {
                let bucket = out
                    .entry(name.clone())
                    .or_default()
                    .entry(version.clone())
                    .or_default();
                for instance_id in instances.keys() {
                    if let Some(core) = self.max_versions.get(instance_id) {
                        *bucket.entry(core.clone()).or_default() += 1;
                    }
                }
            }
        }
        out
    }
}

/// `part / total` as a percentage. A zero total yields a non-finite value.
pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    part as f64 * 100.0 / total as f64
}

/// Converts a grouped SQL count to `u64`; negative sums cannot occur for
/// eligible rows and clamp to zero.
pub(crate) fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
