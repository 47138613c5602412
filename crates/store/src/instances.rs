//! Fact table access for per-instance monthly reports.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};
use stats_core::{
    DbErrorCode, Error, ExistingReport, InstanceMonthlyReport, ReportId, Result, YearMonth,
};

use crate::error::{db_error, json_column_error};

const REPORT_COLUMNS: &str = "id, instance_id, year, month, report_time, count_for_month, \
     jenkins_version_id, jvm_version_id, executors, plugins, jobs, nodes";

fn millis_to_time(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        Error::database(
            DbErrorCode::Decode,
            format!("report_time {ms} is out of range"),
        )
    })
}

fn executors_to_db(executors: u64) -> i64 {
    i64::try_from(executors).unwrap_or(i64::MAX)
}

fn report_from_row(row: &SqliteRow) -> Result<InstanceMonthlyReport> {
    let decode = |e: sqlx::Error| db_error(e, "decode instance report");

    let year: i32 = row.try_get("year").map_err(decode)?;
    let month: u32 = row.try_get("month").map_err(decode)?;
    let month = YearMonth::new(year, month).ok_or_else(|| {
        Error::database(DbErrorCode::Decode, format!("invalid month {year}-{month}"))
    })?;

    let plugins: String = row.try_get("plugins").map_err(decode)?;
    let jobs: String = row.try_get("jobs").map_err(decode)?;
    let nodes: String = row.try_get("nodes").map_err(decode)?;
    let executors: i64 = row.try_get("executors").map_err(decode)?;

    Ok(InstanceMonthlyReport {
        instance_id: row.try_get("instance_id").map_err(decode)?,
        month,
        report_time: millis_to_time(row.try_get("report_time").map_err(decode)?)?,
        count_for_month: row.try_get("count_for_month").map_err(decode)?,
        jenkins_version_id: row.try_get("jenkins_version_id").map_err(decode)?,
        jvm_version_id: row.try_get("jvm_version_id").map_err(decode)?,
        executors: u64::try_from(executors).unwrap_or_default(),
        plugins: serde_json::from_str(&plugins).map_err(|e| json_column_error(e, "plugins"))?,
        jobs: serde_json::from_str(&jobs).map_err(|e| json_column_error(e, "jobs"))?,
        nodes: serde_json::from_str(&nodes).map_err(|e| json_column_error(e, "nodes"))?,
    })
}

/// Looks up the stored row for an instance and month, if any.
pub async fn find_existing<'e, E>(
    executor: E,
    instance_id: &str,
    month: YearMonth,
) -> Result<Option<ExistingReport>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT id, count_for_month, report_time FROM instance_reports \
         WHERE instance_id = ? AND year = ? AND month = ?",
    )
    .bind(instance_id)
    .bind(month.year)
    .bind(month.month)
    .fetch_optional(executor)
    .await
    .map_err(|e| db_error(e, "find instance report"))?;

    let Some(row) = row else {
        return Ok(None);
    };
    let decode = |e: sqlx::Error| db_error(e, "decode instance report");
    Ok(Some(ExistingReport {
        id: row.try_get("id").map_err(decode)?,
        count_for_month: row.try_get("count_for_month").map_err(decode)?,
        report_time: millis_to_time(row.try_get("report_time").map_err(decode)?)?,
    }))
}

/// Inserts a new fact row and returns its id.
pub async fn insert_report<'e, E>(executor: E, report: &InstanceMonthlyReport) -> Result<ReportId>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
INSERT INTO instance_reports (
    instance_id,
    year,
    month,
    report_time,
    count_for_month,
    jenkins_version_id,
    jvm_version_id,
    executors,
    plugins,
    jobs,
    nodes
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.instance_id.as_str())
    .bind(report.month.year)
    .bind(report.month.month)
    .bind(report.report_time.timestamp_millis())
    .bind(report.count_for_month)
    .bind(report.jenkins_version_id)
    .bind(report.jvm_version_id)
    .bind(executors_to_db(report.executors))
    .bind(serde_json::to_string(&report.plugins)?)
    .bind(serde_json::to_string(&report.jobs)?)
    .bind(serde_json::to_string(&report.nodes)?)
    .execute(executor)
    .await
    .map_err(|e| db_error(e, "insert instance report"))?;

    Ok(result.last_insert_rowid())
}

/// Replaces the content of an existing fact row in place.
pub async fn update_report<'e, E>(
    executor: E,
    id: ReportId,
    report: &InstanceMonthlyReport,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
UPDATE instance_reports SET
    report_time = ?,
    count_for_month = ?,
    jenkins_version_id = ?,
    jvm_version_id = ?,
    executors = ?,
    plugins = ?,
    jobs = ?,
    nodes = ?
WHERE id = ?
        "#,
    )
    .bind(report.report_time.timestamp_millis())
    .bind(report.count_for_month)
    .bind(report.jenkins_version_id)
    .bind(report.jvm_version_id)
    .bind(executors_to_db(report.executors))
    .bind(serde_json::to_string(&report.plugins)?)
    .bind(serde_json::to_string(&report.jobs)?)
    .bind(serde_json::to_string(&report.nodes)?)
    .bind(id)
    .execute(executor)
    .await
    .map_err(|e| db_error(e, "update instance report"))?;
    Ok(())
}

/// Advances only the monthly snapshot counter of a row.
pub async fn set_count_for_month<'e, E>(executor: E, id: ReportId, count: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE instance_reports SET count_for_month = ? WHERE id = ?")
        .bind(count)
        .bind(id)
        .execute(executor)
        .await
        .map_err(|e| db_error(e, "advance count_for_month"))?;
    Ok(())
}

/// Fetches the full fact row for an instance and month.
pub async fn fetch_report<'e, E>(
    executor: E,
    instance_id: &str,
    month: YearMonth,
) -> Result<Option<InstanceMonthlyReport>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {REPORT_COLUMNS} FROM instance_reports \
         WHERE instance_id = ? AND year = ? AND month = ?"
    );
    let row = sqlx::query(&sql)
        .bind(instance_id)
        .bind(month.year)
        .bind(month.month)
        .fetch_optional(executor)
        .await
        .map_err(|e| db_error(e, "fetch instance report"))?;

    row.as_ref().map(report_from_row).transpose()
}

/// Fetches every fact row of a month, ordered by instance id.
pub async fn fetch_month<'e, E>(executor: E, month: YearMonth) -> Result<Vec<InstanceMonthlyReport>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {REPORT_COLUMNS} FROM instance_reports \
         WHERE year = ? AND month = ? ORDER BY instance_id"
    );
    let rows = sqlx::query(&sql)
        .bind(month.year)
        .bind(month.month)
        .fetch_all(executor)
        .await
        .map_err(|e| db_error(e, "fetch month reports"))?;

    rows.iter().map(report_from_row).collect()
}

/// Total number of fact rows.
pub async fn count_reports<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM instance_reports")
        .fetch_one(executor)
        .await
        .map_err(|e| db_error(e, "count instance reports"))
}
