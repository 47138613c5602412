//! Store configuration.

use serde::{Deserialize, Serialize};

/// SQLite store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (`sqlite://path/to/file.db` or `sqlite::memory:`)
    #[serde(default = "default_url")]
    pub url: String,
    /// Connection pool size. Ingestion is single-writer.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a writer waits on a locked database, in seconds
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_url() -> String {
    "sqlite://usage-stats.db".to_string()
}

fn default_max_connections() -> u32 {
    1
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}
