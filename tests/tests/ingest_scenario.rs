//! End-to-end behavior of the monthly upsert rules.

use integration_tests::fixtures::{utc, SnapshotBuilder};
use integration_tests::setup::TestContext;
use pretty_assertions::assert_eq;
use stats_core::YearMonth;

const MAVEN: &str = "hudson-maven-MavenModuleSet";
const MATRIX: &str = "hudson-matrix-MatrixProject";
const MULTIJOB: &str = "com-tikal-jenkins-plugins-multijob-MultiJobProject";

const OCT: YearMonth = YearMonth { year: 2021, month: 10 };

#[tokio::test]
async fn test_two_instances_then_update_in_place() {
    let mut ctx = TestContext::new().await;

    let a = SnapshotBuilder::new("A", utc(2021, 10, 30, 23, 59, 54))
        .job(MAVEN, 50)
        .plugins(75)
        .build();
    let b = SnapshotBuilder::new("B", utc(2021, 10, 31, 0, 59, 54))
        .job(MAVEN, 50)
        .job(MULTIJOB, 5)
        .job(MATRIX, 1)
        .plugins(74)
        .build();
    let summary = ctx.importer.import_snapshots("day1", &[a, b]).await.unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(ctx.row_count().await.unwrap(), 2);

    let a_before = ctx.report("A", OCT).await.unwrap();
    assert_eq!(a_before.plugins.len(), 75);
    assert_eq!(a_before.count_for_month, 1);

    let b_later = SnapshotBuilder::new("B", utc(2021, 10, 31, 23, 59, 54))
        .job(MAVEN, 50)
        .job(MULTIJOB, 0)
        .job(MATRIX, 10)
        .plugins(73)
        .build();
    let summary = ctx.importer.import_snapshots("day2", &[b_later]).await.unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(ctx.row_count().await.unwrap(), 2);

    let b_row = ctx.report("B", OCT).await.unwrap();
    assert_eq!(b_row.count_for_month, 2);
    assert_eq!(b_row.plugins.len(), 73);
    assert_eq!(b_row.report_time, utc(2021, 10, 31, 23, 59, 54));

    let jobs = ctx.job_counts(&b_row).await;
    assert_eq!(jobs.get(MULTIJOB).copied().unwrap_or(0), 0);
    assert_eq!(jobs[MATRIX], 10);
    assert_eq!(jobs[MAVEN], 50);

    assert_eq!(ctx.report("A", OCT).await.unwrap(), a_before);
}

#[tokio::test]
async fn test_earlier_second_snapshot_only_advances_count() {
    let mut ctx = TestContext::new().await;

    let first = SnapshotBuilder::new("A", utc(2021, 10, 20, 12, 0, 0))
        .job(MAVEN, 7)
        .plugin("git", "4.10.0")
        .build();
    let earlier = SnapshotBuilder::new("A", utc(2021, 10, 19, 12, 0, 0))
        .job(MAVEN, 99)
        .plugin("git", "4.9.0")
        .plugin("ant", "1.13")
        .build();

    ctx.importer.import_snapshots("f1", &[first]).await.unwrap();
    let before = ctx.report("A", OCT).await.unwrap();

    let summary = ctx.importer.import_snapshots("f2", &[earlier]).await.unwrap();
    assert_eq!(summary.counts_advanced, 1);

    let after = ctx.report("A", OCT).await.unwrap();
    assert_eq!(after.count_for_month, 2);
    assert_eq!(after.report_time, before.report_time);
    assert_eq!(after.plugins, before.plugins);
    assert_eq!(after.jobs, before.jobs);
}

#[tokio::test]
async fn test_equal_timestamp_is_a_duplicate() {
    let mut ctx = TestContext::new().await;
    let snapshot = SnapshotBuilder::new("A", utc(2021, 10, 20, 12, 0, 0))
        .job(MAVEN, 1)
        .build();

    ctx.importer
        .import_snapshots("f1", &[snapshot.clone(), snapshot.clone(), snapshot])
        .await
        .unwrap();

    let row = ctx.report("A", OCT).await.unwrap();
    // only the second sighting advances a duplicate's counter
    assert_eq!(row.count_for_month, 2);
    assert_eq!(ctx.metrics.skipped_not_newer.get(), 1);
}

#[tokio::test]
async fn test_out_of_order_delivery_keeps_newest_content() {
    let mut ctx = TestContext::new().await;
    let at = |day| {
        SnapshotBuilder::new("A", utc(2021, 10, day, 8, 0, 0))
            .job(MAVEN, u64::from(day))
            .build()
    };

    ctx.importer
        .import_snapshots("f1", &[at(12), at(3), at(7), at(25), at(14)])
        .await
        .unwrap();

    assert_eq!(ctx.row_count().await.unwrap(), 1);
    let row = ctx.report("A", OCT).await.unwrap();
    assert_eq!(row.report_time, utc(2021, 10, 25, 8, 0, 0));
    assert_eq!(ctx.job_counts(&row).await[MAVEN], 25);
    // inserted, advanced by the first duplicate, then bumped by the newer one
    assert_eq!(row.count_for_month, 3);
}

#[tokio::test]
async fn test_private_only_jobs_write_nothing() {
    let mut ctx = TestContext::new().await;
    let snapshot = SnapshotBuilder::new("A", utc(2021, 10, 20, 12, 0, 0))
        .job("private-MyJobType", 12)
        .job(MAVEN, 0)
        .plugin("git", "4.10.0")
        .build();

    let summary = ctx.importer.import_snapshots("f1", &[snapshot]).await.unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(ctx.row_count().await.unwrap(), 0);
    assert_eq!(ctx.metrics.skipped_no_jobs.get(), 1);
}

#[tokio::test]
async fn test_private_only_jobs_leave_existing_row_alone() {
    let mut ctx = TestContext::new().await;
    let good = SnapshotBuilder::new("A", utc(2021, 10, 20, 12, 0, 0))
        .job(MAVEN, 4)
        .build();
    let private = SnapshotBuilder::new("A", utc(2021, 10, 21, 12, 0, 0))
        .job("private-MyJobType", 12)
        .build();

    ctx.importer.import_snapshots("f1", &[good]).await.unwrap();
    let before = ctx.report("A", OCT).await.unwrap();
    ctx.importer.import_snapshots("f2", &[private]).await.unwrap();

    assert_eq!(ctx.report("A", OCT).await.unwrap(), before);
}

#[tokio::test]
async fn test_prefiltered_snapshots_are_counted() {
    let mut ctx = TestContext::new().await;
    let long_id = "x".repeat(65);
    let snapshots = vec![
        SnapshotBuilder::new(&long_id, utc(2021, 10, 20, 12, 0, 0))
            .job(MAVEN, 1)
            .build(),
        SnapshotBuilder::new("A", utc(2021, 10, 20, 12, 0, 0))
            .version("2.319-SNAPSHOT")
            .job(MAVEN, 1)
            .build(),
        SnapshotBuilder::new("B", utc(2021, 10, 20, 12, 0, 0))
            .version("2.303.1 (private-09/30/2021-jenkins)")
            .job(MAVEN, 1)
            .build(),
    ];

    let summary = ctx.importer.import_snapshots("f1", &snapshots).await.unwrap();
    assert_eq!(summary.skipped, 3);
    assert_eq!(ctx.row_count().await.unwrap(), 0);
    assert_eq!(ctx.metrics.skipped_instance_id.get(), 1);
    assert_eq!(ctx.metrics.skipped_jenkins_version.get(), 2);
}

#[tokio::test]
async fn test_months_get_separate_rows() {
    let mut ctx = TestContext::new().await;
    let oct = SnapshotBuilder::new("A", utc(2021, 10, 31, 23, 0, 0))
        .job(MAVEN, 1)
        .build();
    let nov = SnapshotBuilder::new("A", utc(2021, 11, 1, 1, 0, 0))
        .job(MAVEN, 2)
        .build();

    ctx.importer.import_snapshots("f1", &[oct, nov]).await.unwrap();

    assert_eq!(ctx.row_count().await.unwrap(), 2);
    let november = ctx.report("A", YearMonth { year: 2021, month: 11 }).await.unwrap();
    assert_eq!(november.count_for_month, 1);
}
