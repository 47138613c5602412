//! Reverse lookups from dimension ids to their values.
//!
//! Each report loads the tables it needs once up front, so the grouped
//! queries can return bare ids and be resolved in memory.

use std::collections::HashMap;

use stats_core::{DimensionId, DimensionKind, PluginRef, Result};
use stats_store::dimensions::{load_names, load_plugins};
use stats_store::StatsDb;
use tracing::debug;

/// Id -> name map for one unversioned dimension table.
#[derive(Debug, Default)]
pub struct NameLookup {
    names: HashMap<DimensionId, String>,
}

impl NameLookup {
    pub async fn load(db: &StatsDb, kind: DimensionKind) -> Result<Self> {
        let names = load_names(db.pool(), kind).await?;
        debug!(kind = %kind, entries = names.len(), "Loaded dimension lookup");
        Ok(Self { names })
    }

    pub fn get(&self, id: DimensionId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Id -> (name, version) map over the plugin table.
#[derive(Debug, Default)]
pub struct PluginLookup {
    plugins: HashMap<DimensionId, PluginRef>,
}

impl PluginLookup {
    pub async fn load(db: &StatsDb) -> Result<Self> {
        let plugins = load_plugins(db.pool()).await?;
        debug!(entries = plugins.len(), "Loaded plugin lookup");
        Ok(Self { plugins })
    }

    pub fn get(&self, id: DimensionId) -> Option<&PluginRef> {
        self.plugins.get(&id)
    }

    /// Every distinct plugin name, in order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.values().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
