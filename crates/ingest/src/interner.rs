//! Dimension interner: get-or-create surrogate ids with an in-process cache.
//!
//! The cache lives for one import run. Lookup-then-insert is not safe against
//! concurrent writers; the unique constraints on the dimension tables reject
//! a racing duplicate with `DB_002`.

use std::collections::HashMap;
use std::sync::Arc;

use stats_core::{DimensionId, DimensionKey, DimensionKind, Result};
use stats_store::dimensions::{find_dimension, insert_dimension};
use stats_store::SqliteConnection;
use telemetry::{ImportMetrics, Timer};
use tracing::trace;

fn resolve_timer(metrics: &ImportMetrics, kind: DimensionKind) -> &Timer {
    match kind {
        DimensionKind::JvmVersion => &metrics.resolve_jvm_version,
        DimensionKind::OsType => &metrics.resolve_os_type,
        DimensionKind::JobType => &metrics.resolve_job_type,
        DimensionKind::JenkinsVersion => &metrics.resolve_jenkins_version,
        DimensionKind::Plugin => &metrics.resolve_plugin,
    }
}

/// Read-through cache over the dimension tables.
#[derive(Default)]
pub struct Interner {
    cache: HashMap<DimensionKey, DimensionId>,
    metrics: Option<Arc<ImportMetrics>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<ImportMetrics>) -> Self {
        Self {
            cache: HashMap::new(),
            metrics: Some(metrics),
        }
    }

    /// Resolves an unversioned dimension value to its id, creating the row if needed.
    pub async fn resolve(
        &mut self,
        conn: &mut SqliteConnection,
        kind: DimensionKind,
        name: &str,
    ) -> Result<DimensionId> {
        self.resolve_key(conn, DimensionKey::named(kind, name)).await
    }

    /// Resolves a plugin (name, version) pair to its id, creating the row if needed.
    pub async fn resolve_plugin(
        &mut self,
        conn: &mut SqliteConnection,
        name: &str,
        version: &str,
    ) -> Result<DimensionId> {
        self.resolve_key(conn, DimensionKey::plugin(name, version)).await
    }

    async fn resolve_key(
        &mut self,
        conn: &mut SqliteConnection,
        key: DimensionKey,
    ) -> Result<DimensionId> {
        let metrics = self.metrics.clone();
        let _timer = metrics
            .as_deref()
            .map(|m| resolve_timer(m, key.kind).start());

        if let Some(&id) = self.cache.get(&key) {
            if let Some(m) = metrics.as_deref() {
                m.dimension_cache_hits.inc();
            }
            return Ok(id);
        }

        let id = match find_dimension(&mut *conn, &key).await? {
            Some(id) => id,
            None => {
                let id = insert_dimension(&mut *conn, &key).await?;
                if let Some(m) = metrics.as_deref() {
                    m.dimension_rows_created.inc();
                }
                trace!(kind = %key.kind, name = %key.name, id, "Created dimension row");
                id
            }
        };

        self.cache.insert(key, id);
        Ok(id)
    }

    /// Drops every cached id. Required after a rollback, since cached ids
    /// may refer to rows that no longer exist.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
