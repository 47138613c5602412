//! Dimension table access: exact-match lookup, insert, and bulk reverse lookups.

use std::collections::HashMap;

use sqlx::{Executor, Row, Sqlite};
use stats_core::{DimensionId, DimensionKey, DimensionKind, PluginRef, Result};

use crate::error::db_error;

/// Looks up a dimension row by its natural key.
pub async fn find_dimension<'e, E>(executor: E, key: &DimensionKey) -> Result<Option<DimensionId>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let kind = key.kind;
    let found = if kind.is_versioned() {
        sqlx::query_scalar::<_, i64>("SELECT id FROM plugins WHERE name = ? AND version = ?")
            .bind(key.name.as_str())
            .bind(key.version.as_deref().unwrap_or_default())
            .fetch_optional(executor)
            .await
    } else {
        let sql = format!(
            "SELECT id FROM {} WHERE {} = ?",
            kind.table(),
            kind.name_column()
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(key.name.as_str())
            .fetch_optional(executor)
            .await
    };
    found.map_err(|e| db_error(e, &format!("find {kind}")))
}

/// Inserts a new dimension row and returns its id.
///
/// Fails with `DB_002` if the key already exists.
pub async fn insert_dimension<'e, E>(executor: E, key: &DimensionKey) -> Result<DimensionId>
where
    E: Executor<'e, Database = Sqlite>,
{
    let kind = key.kind;
    let inserted = if kind.is_versioned() {
        sqlx::query("INSERT INTO plugins (name, version) VALUES (?, ?)")
            .bind(key.name.as_str())
            .bind(key.version.as_deref().unwrap_or_default())
            .execute(executor)
            .await
    } else {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?)",
            kind.table(),
            kind.name_column()
        );
        sqlx::query(&sql)
            .bind(key.name.as_str())
            .execute(executor)
            .await
    };
    let result = inserted.map_err(|e| db_error(e, &format!("insert {kind}")))?;
    Ok(result.last_insert_rowid())
}

/// Loads the full id -> name reverse lookup of an unversioned dimension.
pub async fn load_names<'e, E>(executor: E, kind: DimensionKind) -> Result<HashMap<DimensionId, String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT id, {} AS name FROM {}",
        kind.name_column(),
        kind.table()
    );
    let rows = sqlx::query(&sql)
        .fetch_all(executor)
        .await
        .map_err(|e| db_error(e, &format!("load {kind} names")))?;

    rows.iter()
        .map(|row| {
            let id: i64 = row.try_get("id")?;
            let name: String = row.try_get("name")?;
            Ok((id, name))
        })
        .collect::<std::result::Result<_, sqlx::Error>>()
        .map_err(|e| db_error(e, &format!("decode {kind} names")))
}

/// Loads the full plugin id -> (name, version) reverse lookup.
pub async fn load_plugins<'e, E>(executor: E) -> Result<HashMap<DimensionId, PluginRef>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query("SELECT id, name, version FROM plugins")
        .fetch_all(executor)
        .await
        .map_err(|e| db_error(e, "load plugins"))?;

    rows.iter()
        .map(|row| {
            let id: i64 = row.try_get("id")?;
            let plugin = PluginRef {
                name: row.try_get("name")?,
                version: row.try_get("version")?,
            };
            Ok((id, plugin))
        })
        .collect::<std::result::Result<_, sqlx::Error>>()
        .map_err(|e| db_error(e, "decode plugins"))
}

/// Number of rows in a dimension table.
pub async fn count_dimension<'e, E>(executor: E, kind: DimensionKind) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(executor)
        .await
        .map_err(|e| db_error(e, &format!("count {kind}")))
}
