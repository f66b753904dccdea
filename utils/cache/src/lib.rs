//! Content-addressed memoization cache with per-namespace TTLs.
//!
//! Expensive upstream computations (embeddings, intent classifications,
//! field selections, generated SQL text) are memoized here keyed by a
//! canonical hash of their inputs. The cache is strictly best-effort:
//! a miss, an expired entry, or a failed write all degrade to "compute
//! fresh" and never fail the caller.
//!
//! Entries are only ever replaced wholesale, never updated in place, so
//! concurrent requests need no coordination beyond the per-store lock.

use log::debug;
use lru::LruCache;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::RwLock;

/// Well-known cache namespaces and their default TTLs.
pub mod namespaces {
    use std::time::Duration;

    /// Embeddings of a given text are immutable for a fixed model.
    pub const EMBEDDING: &str = "embedding";
    /// Intent classifications can go stale when the schema changes.
    pub const CLASSIFICATION: &str = "classification";
    /// Schema-dependent table/field selections.
    pub const FIELD_SELECTION: &str = "fieldSelection";
    /// Generated SQL text for a given slim schema.
    pub const SQL_TEXT: &str = "sqlText";

    /// Default TTL for a namespace. Unknown namespaces get a conservative
    /// short TTL rather than an error.
    pub fn default_ttl(namespace: &str) -> Duration {
        match namespace {
            EMBEDDING => Duration::from_secs(24 * 60 * 60),
            CLASSIFICATION => Duration::from_secs(60 * 60),
            FIELD_SELECTION | SQL_TEXT => Duration::from_secs(6 * 60 * 60),
            _ => Duration::from_secs(5 * 60),
        }
    }
}

/// Configuration for the result cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries retained per namespace
    pub capacity_per_namespace: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_per_namespace: 1024,
        }
    }
}

/// Statistics for one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

struct NamespaceState {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl NamespaceState {
    fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }
}

/// Content-addressed key/value cache with lazy per-entry expiry.
///
/// Values are opaque bytes; typed callers serialize at the call site.
/// Namespaces are created on first use and can be invalidated
/// independently (e.g. drop `fieldSelection` and `sqlText` after a schema
/// migration without touching `embedding`).
pub struct ResultCache {
    config: CacheConfig,
    namespaces: RwLock<HashMap<String, NamespaceState>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    /// Create a cache with default configuration
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom configuration
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Derive a deterministic key from a structured input.
    ///
    /// The input is rendered to canonical JSON (object keys sorted, no
    /// dependence on map iteration order) and hashed, so semantically
    /// identical inputs collide to the same key regardless of call site.
    pub fn key<T: Serialize + ?Sized>(
        namespace: &str,
        input: &T,
    ) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_string(&serde_json::to_value(input)?)?;
        let mut hasher = Sha1::new();
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        Ok(format!("{namespace}:{hex}"))
    }

    /// Look up a value. Expired entries are removed on read and count as
    /// misses.
    pub async fn get(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        let mut namespaces = self.namespaces.write().await;
        let state = namespaces.get_mut(namespace)?;

        let expired = match state.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                state.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.pop(key);
            debug!("cache entry expired: {key}");
        }
        state.misses += 1;
        None
    }

    /// Store a value, replacing any previous entry under the same key.
    pub async fn set(&self, namespace: &str, key: &str, value: Vec<u8>, ttl: Duration) {
        let mut namespaces = self.namespaces.write().await;
        let state = namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| NamespaceState::new(self.config.capacity_per_namespace));

        state.entries.put(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry in a namespace, regardless of remaining TTL.
    pub async fn invalidate_namespace(&self, namespace: &str) {
        let mut namespaces = self.namespaces.write().await;
        if let Some(state) = namespaces.get_mut(namespace) {
            state.entries.clear();
            debug!("invalidated cache namespace '{namespace}'");
        }
    }

    /// Statistics for a namespace (zeroed if it was never written).
    pub async fn stats(&self, namespace: &str) -> CacheStats {
        let namespaces = self.namespaces.read().await;
        match namespaces.get(namespace) {
            Some(state) => CacheStats {
                size: state.entries.len(),
                capacity: state.entries.cap().get(),
                hits: state.hits,
                misses: state.misses,
            },
            None => CacheStats {
                capacity: self.config.capacity_per_namespace,
                ..CacheStats::default()
            },
        }
    }
}
