//! The per-instance monthly fact row.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dimension::DimensionId;
use crate::month::YearMonth;

/// Surrogate key of a fact row.
pub type ReportId = i64;

/// One instance's most recently seen telemetry for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMonthlyReport {
    pub instance_id: String,
    pub month: YearMonth,
    /// Timestamp of the newest snapshot folded into this row
    pub report_time: DateTime<Utc>,
    /// Snapshots seen this month, including discarded duplicates
    pub count_for_month: i64,
    pub jenkins_version_id: DimensionId,
    pub jvm_version_id: DimensionId,
    /// Executors summed across nodes
    pub executors: u64,
    /// Plugin dimension ids in snapshot order
    pub plugins: Vec<DimensionId>,
    /// Job type id to job count
    pub jobs: BTreeMap<DimensionId, u64>,
    /// OS type id to node count
    pub nodes: BTreeMap<DimensionId, u64>,
}

/// The subset of a stored fact row the upsert logic needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingReport {
    pub id: ReportId,
    pub count_for_month: i64,
    pub report_time: DateTime<Utc>,
}

impl InstanceMonthlyReport {
    pub fn total_jobs(&self) -> u64 {
        self.jobs.values().sum()
    }
}
