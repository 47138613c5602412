//! Directory imports of gzip-compressed daily files.

use ingest::FileOutcome;
use integration_tests::fixtures::{utc, write_daily_file, SnapshotBuilder};
use integration_tests::setup::TestContext;
use pretty_assertions::assert_eq;
use stats_core::YearMonth;
use stats_store::registry::imported_files;

const FREESTYLE: &str = "hudson-model-FreeStyleProject";
const OCT: YearMonth = YearMonth { year: 2021, month: 10 };

fn line(install: &str, day: u32, jobs: u64) -> String {
    SnapshotBuilder::new(install, utc(2021, 10, day, 10, 0, 0))
        .job(FREESTYLE, jobs)
        .plugin("git", "4.10.0")
        .to_line()
}

#[tokio::test]
async fn test_files_are_folded_in_date_order() {
    let mut ctx = TestContext::new().await;
    // written newest first; the importer must still see day 10 before day 11
    write_daily_file(ctx.dir.path(), "usage.20211011.gz", &[line("A", 11, 11)]);
    write_daily_file(ctx.dir.path(), "usage.20211010.gz", &[line("A", 10, 10)]);

    let dir = ctx.dir.path().to_path_buf();
    let summary = ctx.importer.import_directory(&dir).await.unwrap();
    assert_eq!(summary.files_imported, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.counts_advanced, 0);

    let row = ctx.report("A", OCT).await.unwrap();
    assert_eq!(row.count_for_month, 2);
    assert_eq!(ctx.job_counts(&row).await[FREESTYLE], 11);
}

#[tokio::test]
async fn test_reimport_is_a_no_op() {
    let mut ctx = TestContext::new().await;
    write_daily_file(
        ctx.dir.path(),
        "usage.20211010.gz",
        &[line("A", 10, 1), line("B", 10, 2)],
    );
    let dir = ctx.dir.path().to_path_buf();

    ctx.importer.import_directory(&dir).await.unwrap();
    let a_before = ctx.report("A", OCT).await.unwrap();

    let summary = ctx.importer.import_directory(&dir).await.unwrap();
    assert_eq!(summary.files_imported, 0);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(ctx.row_count().await.unwrap(), 2);
    assert_eq!(ctx.report("A", OCT).await.unwrap(), a_before);

    let files = imported_files(ctx.db.pool()).await.unwrap();
    assert_eq!(files, vec!["usage.20211010.gz".to_string()]);
}

#[tokio::test]
async fn test_malformed_file_is_rolled_back() {
    let mut ctx = TestContext::new().await;
    let good = write_daily_file(ctx.dir.path(), "usage.20211010.gz", &[line("A", 10, 1)]);
    let bad = write_daily_file(
        ctx.dir.path(),
        "usage.20211011.gz",
        &[line("B", 11, 1), "{\"install\":\"C\",".to_string()],
    );

    assert!(matches!(
        ctx.importer.import_file(&good).await.unwrap(),
        FileOutcome::Imported(_)
    ));
    let err = ctx.importer.import_file(&bad).await.unwrap_err();
    assert_eq!(err.error_code(), Some("INPUT_002"));

    assert_eq!(ctx.row_count().await.unwrap(), 1);
    assert!(ctx.report("B", OCT).await.is_none());
    let files = imported_files(ctx.db.pool()).await.unwrap();
    assert_eq!(files, vec!["usage.20211010.gz".to_string()]);
}

#[tokio::test]
async fn test_failed_directory_import_keeps_earlier_files() {
    let mut ctx = TestContext::new().await;
    write_daily_file(ctx.dir.path(), "usage.20211010.gz", &[line("A", 10, 1)]);
    write_daily_file(ctx.dir.path(), "usage.20211011.gz", &["not json".to_string()]);
    write_daily_file(ctx.dir.path(), "usage.20211012.gz", &[line("B", 12, 1)]);
    let dir = ctx.dir.path().to_path_buf();

    assert!(ctx.importer.import_directory(&dir).await.is_err());

    assert!(ctx.report("A", OCT).await.is_some());
    assert!(ctx.report("B", OCT).await.is_none());
}

#[tokio::test]
async fn test_corrupt_numbers_are_tolerated() {
    let mut ctx = TestContext::new().await;
    let negative = line("B", 10, 1).replace("\"executors\":2", "\"executors\":-5");
    assert!(negative.contains("-5"));
    write_daily_file(
        ctx.dir.path(),
        "usage.20211010.gz",
        &[line("A", 10, 1), negative],
    );
    let dir = ctx.dir.path().to_path_buf();

    let summary = ctx.importer.import_directory(&dir).await.unwrap();
    assert_eq!(summary.snapshots_seen, 1);
    assert_eq!(summary.tolerated_decode_skips, 1);
    assert_eq!(ctx.metrics.tolerated_decode_skips.get(), 1);
    assert!(ctx.report("B", OCT).await.is_none());
}

#[tokio::test]
async fn test_private_plugins_never_reach_the_store() {
    let mut ctx = TestContext::new().await;
    let snapshot = SnapshotBuilder::new("A", utc(2021, 10, 10, 10, 0, 0))
        .job(FREESTYLE, 1)
        .plugin("git", "4.10.0")
        .plugin("privateplugin-internal", "1.0")
        .plugin("corp-tools", "2.1 (private)")
        .plugin("broken", "???")
        .to_line();
    write_daily_file(ctx.dir.path(), "usage.20211010.gz", &[snapshot]);
    let dir = ctx.dir.path().to_path_buf();

    ctx.importer.import_directory(&dir).await.unwrap();

    let row = ctx.report("A", OCT).await.unwrap();
    assert_eq!(row.plugins.len(), 1);
}
