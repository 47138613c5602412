//! Reports computed over data that went through the importer.

use integration_tests::fixtures::{utc, SnapshotBuilder};
use integration_tests::setup::TestContext;
use pretty_assertions::assert_eq;
use stats_core::{Snapshot, YearMonth};

const FREESTYLE: &str = "hudson-model-FreeStyleProject";
const PIPELINE: &str = "org-jenkinsci-plugins-workflow-job-WorkflowJob";

const OCT: YearMonth = YearMonth { year: 2021, month: 10 };
const NOV: YearMonth = YearMonth { year: 2021, month: 11 };

/// Two sightings of the same instance in one month, a day apart.
fn twice(builder: SnapshotBuilder, later: chrono::DateTime<chrono::Utc>) -> Vec<Snapshot> {
    let first = builder.build();
    let mut second = builder.build();
    second.timestamp = integration_tests::fixtures::raw_timestamp(later);
    vec![first, second]
}

async fn seeded() -> TestContext {
    let mut ctx = TestContext::new().await;
    let mut snapshots = Vec::new();

    snapshots.extend(twice(
        SnapshotBuilder::new("A", utc(2021, 10, 3, 9, 0, 0))
            .version("2.303.1")
            .agent("Windows 10", 4)
            .job(FREESTYLE, 3)
            .plugin("git", "4.10.0")
            .plugin("workflow-job", "2.42"),
        utc(2021, 10, 4, 9, 0, 0),
    ));
    snapshots.extend(twice(
        SnapshotBuilder::new("B", utc(2021, 10, 5, 9, 0, 0))
            .version("2.289.3")
            .controller_jvm("1.8.0_292")
            .job(PIPELINE, 8)
            .plugin("git", "4.9.0"),
        utc(2021, 10, 6, 9, 0, 0),
    ));
    snapshots.extend(twice(
        SnapshotBuilder::new("C", utc(2021, 10, 7, 9, 0, 0))
            .version("1.651.3")
            .controller_jvm("1.7.0_80")
            .job(FREESTYLE, 1)
            .plugin("git", "2.4.0"),
        utc(2021, 10, 8, 9, 0, 0),
    ));
    // seen once: never eligible
    snapshots.push(
        SnapshotBuilder::new("D", utc(2021, 10, 9, 9, 0, 0))
            .version("2.303.1")
            .job(FREESTYLE, 100)
            .plugin("git", "4.10.0")
            .build(),
    );
    snapshots.extend(twice(
        SnapshotBuilder::new("A", utc(2021, 11, 2, 9, 0, 0))
            .version("2.319")
            .controller_jvm("17.0.1")
            .job(FREESTYLE, 3)
            .plugin("git", "4.10.0"),
        utc(2021, 11, 3, 9, 0, 0),
    ));

    ctx.importer.import_snapshots("seed", &snapshots).await.unwrap();
    ctx
}

#[tokio::test]
async fn test_installations_and_capabilities() {
    let ctx = seeded().await;

    let installations = reports::installations(&ctx.db, OCT).await.unwrap();
    let versions: Vec<(&str, u64)> = installations
        .installations
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    assert_eq!(versions, vec![("1.651.3", 1), ("2.289.3", 1), ("2.303.1", 1)]);

    let capabilities = reports::capabilities(&ctx.db, OCT).await.unwrap();
    assert_eq!(capabilities.installations["2.303.1"], 1);
    assert_eq!(capabilities.installations["2.289.3"], 2);
    assert_eq!(capabilities.installations["1.651.3"], 3);
}

#[tokio::test]
async fn test_plugin_reports() {
    let ctx = seeded().await;

    let latest = reports::latest_plugin_numbers(&ctx.db, OCT).await.unwrap();
    assert_eq!(latest.month, OCT.start().timestamp());
    assert_eq!(latest.plugins["git"], 3);
    assert_eq!(latest.plugins["workflow-job"], 1);

    let trends = reports::plugin_reports(&ctx.db, NOV).await.unwrap();
    let git = trends.iter().find(|r| r.name == "git").unwrap();
    assert_eq!(git.installations.len(), 1);
    assert_eq!(git.installations[&OCT.key()], 3);
    assert_eq!(git.installations_percentages[&OCT.key()], 100.0);
    assert_eq!(git.installations_per_version["4.10.0"], 1);
    assert_eq!(git.installations_per_version["2.4.0"], 1);

    let json = serde_json::to_value(git).unwrap();
    assert!(json["installationsPerVersion"]["4.9.0"].is_number());
}

#[tokio::test]
async fn test_plugin_versions_by_core() {
    let ctx = seeded().await;

    let report = reports::jenkins_versions_for_plugin_versions(&ctx.db, OCT)
        .await
        .unwrap();
    let by_core = report.by_jenkins_version();
    assert_eq!(by_core["git"]["4.10.0"]["2.303.1"], 1);
    assert_eq!(by_core["git"]["4.9.0"]["2.289.3"], 1);
    assert_eq!(by_core["git"]["2.4.0"]["1.651.3"], 1);
    assert!(!report.max_versions.contains_key("D"));
}

#[tokio::test]
async fn test_jvm_report() {
    let ctx = seeded().await;

    let report = reports::jvm_report(&ctx.db, NOV).await.unwrap();
    let october = &report.per_month[&OCT.key()];
    assert_eq!(october["11"], 1);
    assert_eq!(october["1.8"], 1);
    assert_eq!(october["1.7"], 1);
    assert!(!report.per_month.contains_key(&NOV.key()));

    let october_2x = &report.per_month_2x[&OCT.key()];
    assert!(!october_2x.contains_key("1.7"));
}

#[tokio::test]
async fn test_totals() {
    let ctx = seeded().await;

    let jobs = reports::job_totals(&ctx.db, OCT).await.unwrap();
    assert_eq!(jobs[FREESTYLE], 4);
    assert_eq!(jobs[PIPELINE], 8);

    let nodes = reports::os_totals(&ctx.db, OCT).await.unwrap();
    assert_eq!(nodes["Linux"], 3);
    assert_eq!(nodes["Windows 10"], 1);

    let executors = reports::executor_totals(&ctx.db, OCT).await.unwrap();
    assert_eq!(executors["2.303.1"], 6);
    assert_eq!(executors["2.289.3"], 2);
}

#[tokio::test]
async fn test_single_sightings_produce_empty_reports() {
    let mut ctx = TestContext::new().await;
    let snapshots: Vec<Snapshot> = ["A", "B", "C"]
        .into_iter()
        .map(|id| {
            SnapshotBuilder::new(id, utc(2021, 10, 3, 9, 0, 0))
                .job(FREESTYLE, 1)
                .plugin("git", "4.10.0")
                .build()
        })
        .collect();
    ctx.importer.import_snapshots("seed", &snapshots).await.unwrap();

    assert!(reports::installations(&ctx.db, OCT).await.unwrap().installations.is_empty());
    assert!(reports::capabilities(&ctx.db, OCT).await.unwrap().installations.is_empty());
    assert!(reports::latest_plugin_numbers(&ctx.db, OCT).await.unwrap().plugins.is_empty());
    assert!(reports::jvm_report(&ctx.db, NOV).await.unwrap().per_month.is_empty());
    assert!(reports::job_totals(&ctx.db, OCT).await.unwrap().is_empty());
    assert!(reports::os_totals(&ctx.db, OCT).await.unwrap().is_empty());
    assert!(reports::executor_totals(&ctx.db, OCT).await.unwrap().is_empty());

    let trends = reports::plugin_reports(&ctx.db, NOV).await.unwrap();
    assert!(trends.iter().all(|r| r.installations.is_empty()));
}
