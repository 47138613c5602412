//! Report-file registry: the ledger of daily files already folded in.

use chrono::Utc;
use sqlx::{Executor, Sqlite};
use stats_core::Result;

use crate::error::db_error;

/// Whether a daily file was already fully ingested.
pub async fn is_file_imported<'e, E>(executor: E, filename: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM report_files WHERE filename = ?")
        .bind(filename)
        .fetch_optional(executor)
        .await
        .map_err(|e| db_error(e, "look up report file"))?;
    Ok(found.is_some())
}

/// Records a daily file as ingested. Fails with `DB_002` if it already is.
pub async fn mark_file_imported<'e, E>(executor: E, filename: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO report_files (filename, imported_at) VALUES (?, ?)")
        .bind(filename)
        .bind(Utc::now().timestamp_millis())
        .execute(executor)
        .await
        .map_err(|e| db_error(e, "mark report file"))?;
    Ok(())
}

/// All ingested filenames, sorted.
pub async fn imported_files<'e, E>(executor: E) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>("SELECT filename FROM report_files ORDER BY filename")
        .fetch_all(executor)
        .await
        .map_err(|e| db_error(e, "list report files"))
}
