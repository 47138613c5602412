//! SQLite store for the usage statistics engine.

pub mod client;
pub mod config;
pub mod dimensions;
pub mod error;
pub mod health;
pub mod instances;
pub mod query;
pub mod registry;
pub mod schema;

pub use client::*;
pub use config::*;
pub use error::db_error;
pub use sqlx::SqliteConnection;
