//! Fact-table seeding for report tests.

use std::collections::BTreeMap;

use chrono::Duration;
use stats_core::{DimensionId, DimensionKey, DimensionKind, InstanceMonthlyReport, YearMonth};
use stats_store::dimensions::{find_dimension, insert_dimension};
use stats_store::instances::insert_report;
use stats_store::StatsDb;

pub(crate) const OCT: YearMonth = YearMonth { year: 2021, month: 10 };
pub(crate) const NOV: YearMonth = YearMonth { year: 2021, month: 11 };

pub(crate) async fn dim(db: &StatsDb, key: DimensionKey) -> DimensionId {
    match find_dimension(db.pool(), &key).await.unwrap() {
        Some(id) => id,
        None => insert_dimension(db.pool(), &key).await.unwrap(),
    }
}

pub(crate) async fn named(db: &StatsDb, kind: DimensionKind, name: &str) -> DimensionId {
    dim(db, DimensionKey::named(kind, name)).await
}

pub(crate) async fn plugin(db: &StatsDb, name: &str, version: &str) -> DimensionId {
    dim(db, DimensionKey::plugin(name, version)).await
}

/// A fact row with no plugins, jobs or nodes on the given versions.
pub(crate) async fn row(
    db: &StatsDb,
    instance_id: &str,
    month: YearMonth,
    count_for_month: i64,
    jenkins: &str,
    jvm: &str,
) -> InstanceMonthlyReport {
    InstanceMonthlyReport {
        instance_id: instance_id.to_string(),
        month,
        report_time: month.start() + Duration::days(1),
        count_for_month,
        jenkins_version_id: named(db, DimensionKind::JenkinsVersion, jenkins).await,
        jvm_version_id: named(db, DimensionKind::JvmVersion, jvm).await,
        executors: 0,
        plugins: Vec::new(),
        jobs: BTreeMap::new(),
        nodes: BTreeMap::new(),
    }
}

pub(crate) async fn insert(db: &StatsDb, report: &InstanceMonthlyReport) {
    insert_report(db.pool(), report).await.unwrap();
}
