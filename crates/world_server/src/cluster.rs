//! Cluster-visible cache integration.
//!
//! Every running node advertises one [`WorldChannel`] record in a shared
//! cache keyed by its node id. The login tier and sibling world nodes read
//! these records to route players; absence of a record is the authoritative
//! "not currently reachable" signal, so the record is written only after the
//! accept socket is live and deleted first during graceful shutdown.
//!
//! The cache itself is a remote shared resource reached through the
//! [`ClusterCache`] trait. Writes and deletes must stay idempotent because
//! startup and shutdown sequences may retry; no consensus is assumed between
//! the cache and any node's local state, so readers tolerate eventual
//! convergence.

use crate::error::ServerError;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

/// The logical caches shared across the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
    /// World channel reachability records, keyed by stringified node id.
    ClusterWorldChannels,
    /// Per-character cache entries refreshed via `PlayerCacheUpdate`.
    Players,
}

/// A node's advertised reachability record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldChannel {
    /// Cluster the node belongs to.
    pub cluster_id: u16,
    /// Host sibling processes connect to.
    pub host: String,
    /// Port sibling processes connect to.
    pub port: u16,
    /// Node id, also the cache key.
    pub id: u16,
    /// Display name.
    pub name: String,
}

/// One shared key/value cache.
///
/// Keys are strings; values are JSON documents so the same cache backend can
/// hold heterogeneous record types.
pub trait ClusterCache: Send + Sync {
    /// Returns true if `key` currently has a value.
    fn contains(&self, key: &str) -> bool;

    /// Fetches the raw value for `key`.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), ServerError>;

    /// Removes `key`. Removing an absent key is a no-op, not an error.
    fn delete(&self, key: &str) -> Result<(), ServerError>;
}

/// Typed convenience layer over [`ClusterCache`].
pub trait ClusterCacheExt: ClusterCache {
    /// Serializes and stores a typed record.
    fn set_record<T: Serialize>(&self, key: &str, record: &T) -> Result<(), ServerError> {
        let value = serde_json::to_value(record)
            .map_err(|e| ServerError::Internal(format!("cache record serialization: {e}")))?;
        self.set(key, value)
    }

    /// Fetches and deserializes a typed record.
    ///
    /// A value that fails to deserialize is treated as absent; a stale or
    /// foreign record must not break routing.
    fn get_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

impl<C: ClusterCache + ?Sized> ClusterCacheExt for C {}

/// Hands out the shared caches by type.
pub trait CacheManager: Send + Sync {
    /// Returns the cache handle for `cache_type`.
    fn get_cache(&self, cache_type: CacheType) -> Arc<dyn ClusterCache>;
}

/// In-memory cache backend.
///
/// One `DashMap` per [`CacheType`], shared by every handle cloned from the
/// same manager. Stands in for the networked cache in tests and
/// single-process deployments; the trait seam keeps the server code
/// identical either way.
#[derive(Default)]
pub struct InMemoryCacheManager {
    caches: DashMap<CacheType, Arc<InMemoryCache>>,
}

impl InMemoryCacheManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheManager for InMemoryCacheManager {
    fn get_cache(&self, cache_type: CacheType) -> Arc<dyn ClusterCache> {
        self.caches
            .entry(cache_type)
            .or_insert_with(|| Arc::new(InMemoryCache::default()))
            .clone()
    }
}

/// `DashMap`-backed cache used by [`InMemoryCacheManager`].
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, serde_json::Value>,
}

impl ClusterCache for InMemoryCache {
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), ServerError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ServerError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_channel() -> WorldChannel {
        WorldChannel {
            cluster_id: 1,
            host: "10.0.0.5".to_string(),
            port: 5400,
            id: 3,
            name: "Channel-3".to_string(),
        }
    }

    #[test]
    fn record_round_trips_through_the_cache() {
        let manager = InMemoryCacheManager::new();
        let cache = manager.get_cache(CacheType::ClusterWorldChannels);
        let channel = sample_channel();

        cache
            .set_record(&channel.id.to_string(), &channel)
            .expect("set failed");

        let read: WorldChannel = cache
            .get_record(&channel.id.to_string())
            .expect("record missing");
        assert_eq!(read, channel);
    }

    #[test]
    fn delete_is_idempotent() {
        let manager = InMemoryCacheManager::new();
        let cache = manager.get_cache(CacheType::ClusterWorldChannels);
        cache
            .set_record("3", &sample_channel())
            .expect("set failed");

        cache.delete("3").expect("first delete failed");
        cache.delete("3").expect("second delete must be a no-op");
        assert!(!cache.contains("3"));
    }

    #[test]
    fn caches_are_shared_per_type_but_isolated_across_types() {
        let manager = InMemoryCacheManager::new();
        let a = manager.get_cache(CacheType::ClusterWorldChannels);
        let b = manager.get_cache(CacheType::ClusterWorldChannels);
        let players = manager.get_cache(CacheType::Players);

        a.set_record("3", &sample_channel()).expect("set failed");
        assert!(b.contains("3"));
        assert!(!players.contains("3"));
    }
}
