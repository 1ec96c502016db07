//! Result cache.
//!
//! Envelopes are keyed by a [`Fingerprint`] of the normalized query. Entries
//! live for a short time-to-live; [`MemoryCache`] additionally evicts the
//! least recently used entry once it holds `max_entries`.
//!
//! The cache never fails a query: a poisoned lock or an unreachable store is
//! a miss.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::model::{Query, QueryType, ResponseEnvelope, Target};

/// Deterministic cache key of a query.
///
/// SHA-256 over the query type, the canonical target, the VRF name and the
/// sorted, de-duplicated device names. Targets are canonicalized when parsed,
/// so `10.1.2.3/8` and `10.0.0.0/8`, or `NO-EXPORT` and `no-export`, collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint from query parts.
    pub fn new<'a>(
        query_type: QueryType,
        target: &Target,
        vrf: &str,
        devices: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut devices: Vec<&str> = devices.into_iter().collect();
        devices.sort_unstable();
        devices.dedup();

        let canonical = format!("{}|{}|{}|{}", query_type, target, vrf, devices.join(","));
        Self(format!("{:x}", Sha256::digest(canonical.as_bytes())))
    }

    /// Fingerprint of a validated query.
    pub fn of(query: &Query) -> Self {
        Self::new(
            query.query_type(),
            query.target(),
            &query.vrf().name,
            query.device_names(),
        )
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of an entry, in seconds.
    #[serde(deserialize_with = "crate::config::seconds")]
    pub timeout: Duration,

    /// Maximum number of entries; unbounded when unset.
    pub max_entries: Option<usize>,

    /// Whether a hit pushes the entry's expiry out by another `timeout`.
    pub refresh_on_hit: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_entries: None,
            refresh_on_hit: true,
        }
    }
}

/// Store for aggregated envelopes.
///
/// Implementations must tolerate concurrent `get`/`put`; the last `put` for
/// a fingerprint wins, and a `get` never observes a partially written
/// envelope.
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Envelope stored under `key`, if present and not expired.
    async fn get(&self, key: &Fingerprint) -> Option<ResponseEnvelope>;

    /// Store an envelope for `ttl`.
    async fn put(&self, key: Fingerprint, envelope: ResponseEnvelope, ttl: Duration);
}

#[derive(Debug)]
struct CacheEntry {
    envelope: ResponseEnvelope,
    expires_at: Instant,
    ttl: Duration,
}

/// In-process cache with expiry and LRU eviction.
///
/// Entries are kept in recency order: index 0 is the least recently used.
/// A hit reorders the whole map, so every access takes the one lock.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<IndexMap<Fingerprint, CacheEntry>>,
    max_entries: Option<usize>,
    refresh_on_hit: bool,
}

impl MemoryCache {
    /// Unbounded cache that refreshes entries on hit.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            max_entries: None,
            refresh_on_hit: true,
        }
    }

    /// Cache configured from settings.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            refresh_on_hit: config.refresh_on_hit,
            ..Self::new()
        }
    }

    /// Bound the number of entries.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Set whether hits refresh expiry.
    pub fn with_refresh_on_hit(mut self, refresh: bool) -> Self {
        self.refresh_on_hit = refresh;
        self
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &Fingerprint) -> Option<ResponseEnvelope> {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("cache lock poisoned; treating {} as a miss", key);
            return None;
        };

        let now = Instant::now();
        let mut entry = entries.shift_remove(key)?;
        if entry.expires_at <= now {
            debug!("cache entry {} expired", key);
            return None;
        }

        if self.refresh_on_hit {
            entry.expires_at = now + entry.ttl;
        }
        let envelope = entry.envelope.clone();
        entries.insert(key.clone(), entry);
        Some(envelope)
    }

    async fn put(&self, key: Fingerprint, envelope: ResponseEnvelope, ttl: Duration) {
        let Ok(mut entries) = self.entries.lock() else {
            warn!("cache lock poisoned; not storing {}", key);
            return;
        };

        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.shift_remove(&key);
        entries.insert(
            key,
            CacheEntry {
                envelope,
                expires_at: now + ttl,
                ttl,
            },
        );

        if let Some(max) = self.max_entries {
            while entries.len() > max {
                if let Some((evicted, _)) = entries.shift_remove_index(0) {
                    debug!("cache full; evicted {}", evicted);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(qt: QueryType, raw: &str) -> Target {
        Target::parse(qt, raw).unwrap()
    }

    fn envelope(id: &str) -> ResponseEnvelope {
        ResponseEnvelope {
            id: id.to_string(),
            query_type: QueryType::BgpRoute,
            target: "8.8.8.0/24".to_string(),
            vrf: "default".to_string(),
            results: vec![],
            runtime_ms: 12,
            timestamp: 1_792_000_000,
            cached: false,
        }
    }

    fn key(name: &str) -> Fingerprint {
        Fingerprint::new(QueryType::BgpRoute, &target(QueryType::BgpRoute, "8.8.8.8"), "default", [name])
    }

    #[test]
    fn test_fingerprint_normalization() {
        let a = Fingerprint::new(
            QueryType::BgpRoute,
            &target(QueryType::BgpRoute, "10.1.2.3/8"),
            "default",
            ["r2", "r1"],
        );
        let b = Fingerprint::new(
            QueryType::BgpRoute,
            &target(QueryType::BgpRoute, " 10.0.0.0/8"),
            "default",
            ["r1", "r2", "r1"],
        );
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);

        let c = Fingerprint::new(
            QueryType::BgpCommunity,
            &target(QueryType::BgpCommunity, "NO-EXPORT"),
            "default",
            ["r1"],
        );
        let d = Fingerprint::new(
            QueryType::BgpCommunity,
            &target(QueryType::BgpCommunity, "no-export"),
            "default",
            ["r1"],
        );
        assert_eq!(c, d);
    }

    #[test]
    fn test_fingerprint_distinguishes_queries() {
        let route = target(QueryType::BgpRoute, "8.8.8.8");
        let base = Fingerprint::new(QueryType::BgpRoute, &route, "default", ["r1"]);
        assert_ne!(base, Fingerprint::new(QueryType::BgpRoute, &route, "customer-a", ["r1"]));
        assert_ne!(base, Fingerprint::new(QueryType::BgpRoute, &route, "default", ["r1", "r2"]));
        let ping = target(QueryType::Ping, "8.8.8.8");
        assert_ne!(base, Fingerprint::new(QueryType::Ping, &ping, "default", ["r1"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry() {
        let cache = MemoryCache::new().with_refresh_on_hit(false);
        cache.put(key("r1"), envelope("a"), Duration::from_secs(30)).await;

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get(&key("r1")).await.unwrap().id, "a");

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key("r1")).await.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_on_hit() {
        let cache = MemoryCache::new();
        cache.put(key("r1"), envelope("a"), Duration::from_secs(30)).await;

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(cache.get(&key("r1")).await.is_some());
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(cache.get(&key("r1")).await.is_some());
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.get(&key("r1")).await.is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new().with_max_entries(2);
        let ttl = Duration::from_secs(60);
        cache.put(key("r1"), envelope("1"), ttl).await;
        cache.put(key("r2"), envelope("2"), ttl).await;

        // Touch r1 so r2 becomes the least recently used.
        assert!(cache.get(&key("r1")).await.is_some());
        cache.put(key("r3"), envelope("3"), ttl).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("r2")).await.is_none());
        assert!(cache.get(&key("r1")).await.is_some());
        assert!(cache.get(&key("r3")).await.is_some());
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        tokio_test::block_on(async {
            cache.put(key("r1"), envelope("first"), ttl).await;
            cache.put(key("r1"), envelope("second"), ttl).await;
        });
        assert_eq!(cache.len(), 1);
        let hit = tokio_test::block_on(cache.get(&key("r1")));
        assert_eq!(hit.unwrap().id, "second");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_and_put() {
        use std::sync::Arc;

        fn written(n: u64) -> ResponseEnvelope {
            ResponseEnvelope {
                runtime_ms: n,
                timestamp: 1_792_000_000 + n,
                ..envelope(&format!("w{n}"))
            }
        }

        let cache = Arc::new(MemoryCache::new());
        let ttl = Duration::from_secs(60);
        let mut tasks = Vec::new();
        for n in 0..32u64 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                cache.put(key("r1"), written(n), ttl).await;
                let mut hits = Vec::new();
                for _ in 0..50 {
                    if let Some(hit) = cache.get(&key("r1")).await {
                        hits.push(hit);
                    }
                    tokio::task::yield_now().await;
                }
                hits
            }));
        }

        for task in tasks {
            for hit in task.await.unwrap() {
                assert_eq!(hit, written(hit.runtime_ms));
            }
        }

        cache.put(key("r1"), written(99), ttl).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("r1")).await.unwrap(), written(99));
    }

    #[test]
    fn test_config_defaults_and_yaml() {
        let config: CacheConfig = serde_yaml::from_str("timeout: 30\nmax_entries: 500\n").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_entries, Some(500));
        assert!(config.refresh_on_hit);
        assert_eq!(CacheConfig::default().timeout, Duration::from_secs(120));
    }
}
