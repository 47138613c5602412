//! Grouped read queries over the fact table.
//!
//! Every query only counts eligible rows (`count_for_month >= 2`). Plugin,
//! job and node collections are expanded with `json_each`, so each query is a
//! single statement regardless of how many dimension values exist.

use sqlx::{Executor, Sqlite};
use stats_core::limits::MIN_ELIGIBLE_COUNT_FOR_MONTH;
use stats_core::{DimensionId, Result, YearMonth};

use crate::error::db_error;

/// Jenkins versions that count as releases: numeric-leading and not private.
const RELEASE_VERSION_FILTER: &str =
    "jv.version GLOB '[0-9]*' AND instr(jv.version, 'private') = 0";

/// Eligible instance count per release Jenkins version, ordered by version.
pub async fn installation_counts<'e, E>(executor: E, month: YearMonth) -> Result<Vec<(String, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
SELECT jv.version, COUNT(*) AS number
FROM instance_reports r
JOIN jenkins_versions jv ON jv.id = r.jenkins_version_id
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
  AND {RELEASE_VERSION_FILTER}
GROUP BY jv.version
ORDER BY jv.version
        "#
    );
    sqlx::query_as::<_, (String, i64)>(&sql)
        .bind(month.year)
        .bind(month.month)
        .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
        .fetch_all(executor)
        .await
        .map_err(|e| db_error(e, "query installation counts"))
}

/// Plugin-list references per plugin id for one month.
pub async fn plugin_counts<'e, E>(executor: E, month: YearMonth) -> Result<Vec<(DimensionId, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64)>(
        r#"
SELECT CAST(p.value AS INTEGER) AS plugin_id, COUNT(*) AS number
FROM instance_reports r, json_each(r.plugins) p
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
GROUP BY plugin_id
        "#,
    )
    .bind(month.year)
    .bind(month.month)
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query plugin counts"))
}

/// Plugin-list references per (month, plugin id) across every month except `excluded`.
pub async fn plugin_counts_by_month<'e, E>(
    executor: E,
    excluded: YearMonth,
) -> Result<Vec<(i32, u32, DimensionId, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i32, u32, i64, i64)>(
        r#"
SELECT r.year, r.month, CAST(p.value AS INTEGER) AS plugin_id, COUNT(*) AS number
FROM instance_reports r, json_each(r.plugins) p
WHERE r.count_for_month >= ? AND NOT (r.year = ? AND r.month = ?)
GROUP BY r.year, r.month, plugin_id
ORDER BY r.year, r.month
        "#,
    )
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .bind(excluded.year)
    .bind(excluded.month)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query plugin counts by month"))
}

/// Eligible row count per month, across all months.
pub async fn eligible_totals_by_month<'e, E>(executor: E) -> Result<Vec<(i32, u32, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i32, u32, i64)>(
        r#"
SELECT year, month, COUNT(*) AS number
FROM instance_reports
WHERE count_for_month >= ?
GROUP BY year, month
ORDER BY year, month
        "#,
    )
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query eligible totals"))
}

/// Eligible row count per (month, JVM version id, Jenkins version id), excluding `excluded`.
pub async fn jvm_counts_by_month<'e, E>(
    executor: E,
    excluded: YearMonth,
) -> Result<Vec<(i32, u32, DimensionId, DimensionId, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i32, u32, i64, i64, i64)>(
        r#"
SELECT year, month, jvm_version_id, jenkins_version_id, COUNT(*) AS number
FROM instance_reports
WHERE count_for_month >= ? AND NOT (year = ? AND month = ?)
GROUP BY year, month, jvm_version_id, jenkins_version_id
ORDER BY year, month
        "#,
    )
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .bind(excluded.year)
    .bind(excluded.month)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query jvm counts by month"))
}

/// Summed job count per job type id for one month.
pub async fn job_totals<'e, E>(executor: E, month: YearMonth) -> Result<Vec<(DimensionId, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64)>(
        r#"
SELECT CAST(j.key AS INTEGER) AS job_type_id, SUM(j.value) AS total
FROM instance_reports r, json_each(r.jobs) j
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
GROUP BY job_type_id
        "#,
    )
    .bind(month.year)
    .bind(month.month)
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query job totals"))
}

/// Summed node count per OS type id for one month.
pub async fn node_totals<'e, E>(executor: E, month: YearMonth) -> Result<Vec<(DimensionId, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64)>(
        r#"
SELECT CAST(n.key AS INTEGER) AS os_type_id, SUM(n.value) AS total
FROM instance_reports r, json_each(r.nodes) n
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
GROUP BY os_type_id
        "#,
    )
    .bind(month.year)
    .bind(month.month)
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query node totals"))
}

/// Summed executors per Jenkins version string for one month.
pub async fn executor_totals<'e, E>(executor: E, month: YearMonth) -> Result<Vec<(String, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (String, i64)>(
        r#"
SELECT jv.version, SUM(r.executors) AS total
FROM instance_reports r
JOIN jenkins_versions jv ON jv.id = r.jenkins_version_id
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
GROUP BY jv.version
ORDER BY jv.version
        "#,
    )
    .bind(month.year)
    .bind(month.month)
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query executor totals"))
}

/// Highest release Jenkins version per eligible instance for one month.
pub async fn max_version_per_instance<'e, E>(
    executor: E,
    month: YearMonth,
) -> Result<Vec<(String, String)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
SELECT r.instance_id, MAX(jv.version) AS version
FROM instance_reports r
JOIN jenkins_versions jv ON jv.id = r.jenkins_version_id
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
  AND {RELEASE_VERSION_FILTER}
GROUP BY r.instance_id
        "#
    );
    sqlx::query_as::<_, (String, String)>(&sql)
        .bind(month.year)
        .bind(month.month)
        .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
        .fetch_all(executor)
        .await
        .map_err(|e| db_error(e, "query max version per instance"))
}

/// Plugin-list references per (plugin id, instance id) for one month.
pub async fn plugin_instance_counts<'e, E>(
    executor: E,
    month: YearMonth,
) -> Result<Vec<(DimensionId, String, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, String, i64)>(
        r#"
SELECT CAST(p.value AS INTEGER) AS plugin_id, r.instance_id, COUNT(*) AS number
FROM instance_reports r, json_each(r.plugins) p
WHERE r.year = ? AND r.month = ? AND r.count_for_month >= ?
GROUP BY plugin_id, r.instance_id
ORDER BY r.instance_id
        "#,
    )
    .bind(month.year)
    .bind(month.month)
    .bind(MIN_ELIGIBLE_COUNT_FOR_MONTH)
    .fetch_all(executor)
    .await
    .map_err(|e| db_error(e, "query plugin instance counts"))
}
