//! SQLite table schemas.
//!
//! - One table per dimension with a uniqueness constraint on its natural key
//! - `instance_reports` holds one fact row per (instance, year, month)
//! - `report_times` are Unix milliseconds
//! - plugin/job/node collections are JSON text columns

use sqlx::SqlitePool;
use stats_core::Result;
use tracing::debug;

use crate::error::db_error;

pub const CREATE_JVM_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jvm_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_OS_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS os_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_JOB_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS job_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_JENKINS_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS jenkins_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_PLUGINS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS plugins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    version TEXT NOT NULL,
    UNIQUE (name, version)
)
"#;

/// Append-only ledger of fully ingested daily files.
pub const CREATE_REPORT_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS report_files (
    filename TEXT PRIMARY KEY,
    imported_at INTEGER NOT NULL
)
"#;

/// The fact table.
pub const CREATE_INSTANCE_REPORTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS instance_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    instance_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    report_time INTEGER NOT NULL,
    count_for_month INTEGER NOT NULL,
    jenkins_version_id INTEGER NOT NULL REFERENCES jenkins_versions (id),
    jvm_version_id INTEGER NOT NULL REFERENCES jvm_versions (id),
    executors INTEGER NOT NULL DEFAULT 0,
    -- JSON array of plugin ids
    plugins TEXT NOT NULL DEFAULT '[]',
    -- JSON object: job type id -> job count
    jobs TEXT NOT NULL DEFAULT '{}',
    -- JSON object: os type id -> node count
    nodes TEXT NOT NULL DEFAULT '{}',
    UNIQUE (instance_id, year, month)
)
"#;

pub const CREATE_INSTANCE_REPORTS_MONTH_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_instance_reports_month
    ON instance_reports (year, month, count_for_month)
"#;

/// All DDL statements in creation order.
pub fn all_tables() -> Vec<&'static str> {
    vec![
        CREATE_JVM_VERSIONS_TABLE,
        CREATE_OS_TYPES_TABLE,
        CREATE_JOB_TYPES_TABLE,
        CREATE_JENKINS_VERSIONS_TABLE,
        CREATE_PLUGINS_TABLE,
        CREATE_REPORT_FILES_TABLE,
        CREATE_INSTANCE_REPORTS_TABLE,
        CREATE_INSTANCE_REPORTS_MONTH_INDEX,
    ]
}

/// Creates every table and index that does not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for ddl in all_tables() {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| db_error(e, "execute DDL"))?;
    }

    debug!("Statistics schema initialized");
    Ok(())
}
