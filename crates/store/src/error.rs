//! Mapping from `sqlx` failures onto coded storage errors.

use stats_core::{DbErrorCode, Error};

/// Converts a `sqlx` error into a coded storage error, prefixed with `context`.
pub fn db_error(err: sqlx::Error, context: &str) -> Error {
    let code = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DbErrorCode::ConstraintViolation,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_check_violation() => {
            DbErrorCode::ConstraintViolation
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => DbErrorCode::Decode,
        _ => DbErrorCode::QueryFailed,
    };
    Error::database(code, format!("{context}: {err}"))
}

/// Converts a JSON column decode failure into a coded storage error.
pub fn json_column_error(err: serde_json::Error, column: &str) -> Error {
    Error::database(
        DbErrorCode::Decode,
        format!("invalid JSON in column {column}: {err}"),
    )
}
