//! Store health checks.

use tracing::{debug, error};

use crate::client::StatsDb;

/// Check database connection health.
pub async fn check_connection(db: &StatsDb) -> bool {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(db.pool())
        .await
    {
        Ok(_) => {
            debug!("Statistics database connection healthy");
            true
        }
        Err(e) => {
            error!("Statistics database health check failed: {}", e);
            false
        }
    }
}
