//! Caching layer for built network graphs.
//!
//! Graphs are keyed by network revision. The network store bumps its
//! revision whenever a station or connection changes, so a cached graph is
//! never stale; the TTL only bounds memory held by old revisions.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::debug;

use super::graph::NetworkGraph;
use crate::store::{NetworkStore, StoreError};

/// Configuration for the graph cache.
#[derive(Debug, Clone)]
pub struct GraphCacheConfig {
    /// TTL for cached graphs.
    pub ttl: Duration,

    /// Maximum number of cached revisions.
    pub max_capacity: u64,
}

impl Default for GraphCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(10 * 60),
            max_capacity: 4,
        }
    }
}

/// Cache of network graphs, keyed by revision.
#[derive(Clone)]
pub struct GraphCache {
    graphs: MokaCache<u64, Arc<NetworkGraph>>,
}

impl GraphCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &GraphCacheConfig) -> Self {
        let graphs = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { graphs }
    }

    /// Get the graph for the store's current revision, building it on a miss.
    pub fn graph_for<S: NetworkStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Arc<NetworkGraph>, StoreError> {
        let revision = store.network_revision()?;

        if let Some(cached) = self.graphs.get(&revision) {
            return Ok(cached);
        }

        debug!(revision, "graph cache miss");
        let graph = Arc::new(NetworkGraph::build(
            revision,
            store.stations()?,
            store.connections()?,
        ));
        self.graphs.insert(revision, graph.clone());
        Ok(graph)
    }

    /// Number of cached graphs (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.graphs.entry_count()
    }

    /// Drop all cached graphs.
    pub fn invalidate_all(&self) {
        self.graphs.invalidate_all();
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new(&GraphCacheConfig::default())
    }
}
