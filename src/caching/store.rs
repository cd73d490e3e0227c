//! # Response Cache Store
//!
//! The keyed in-memory store for upstream LLM responses. The store owns its
//! key → entry map exclusively; all mutation goes through the methods here,
//! which keep two invariants after every operation: the entry count never
//! exceeds `max_entries` and the estimated memory footprint never exceeds
//! `max_memory_bytes`. When an insert would break either, the configured
//! [`EvictionStrategy`] picks victims until headroom exists.
//!
//! TTL expiry is enforced lazily on read (an expired entry is a miss and is
//! removed on the spot) and proactively by a periodic sweep task.

use super::entry::CacheEntry;
use super::eviction::EvictionStrategy;
use super::stats::{format_bytes, format_uptime, CacheStats};
use super::{CacheError, CacheResult};
use crate::core::clock::Clock;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on entries returned by [`ResponseCache::detailed_info`].
const RECENT_ENTRIES_CAP: usize = 25;

/// Characters of the value shown in entry summaries.
const VALUE_PREVIEW_CHARS: usize = 80;

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries.
    pub max_entries: usize,

    /// Maximum estimated memory usage in bytes.
    pub max_memory_bytes: usize,

    /// TTL applied when a `set` does not specify one; `None` disables
    /// default expiry.
    #[serde(with = "humantime_serde::option")]
    pub default_ttl: Option<Duration>,

    /// Victim selection strategy.
    pub eviction_strategy: EvictionStrategy,

    /// Interval of the background expiry sweep.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// Snapshot file for best-effort persistence across restarts.
    pub snapshot_path: Option<std::path::PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_memory_bytes: 50 * 1024 * 1024, // 50MB
            default_ttl: Some(Duration::from_secs(3600)),
            eviction_strategy: EvictionStrategy::default(),
            sweep_interval: Duration::from_secs(60),
            snapshot_path: None,
        }
    }
}

impl CacheConfig {
    /// Replace out-of-range limits with the documented defaults.
    ///
    /// Bad configuration is logged and substituted, never fatal.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.max_entries == 0 {
            warn!(
                "cache.max_entries of 0 is invalid, using default {}",
                defaults.max_entries
            );
            self.max_entries = defaults.max_entries;
        }
        if self.max_memory_bytes == 0 {
            warn!(
                "cache.max_memory_bytes of 0 is invalid, using default {}",
                defaults.max_memory_bytes
            );
            self.max_memory_bytes = defaults.max_memory_bytes;
        }
        if self.sweep_interval.is_zero() {
            warn!(
                "cache.sweep_interval of 0 is invalid, using default {:?}",
                defaults.sweep_interval
            );
            self.sweep_interval = defaults.sweep_interval;
        }

        self
    }
}

/// Per-entry options for [`ResponseCache::set_with`].
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    /// TTL override; `None` falls back to the configured default TTL.
    pub ttl: Option<Duration>,

    /// Tags for group invalidation.
    pub tags: Vec<String>,
}

/// Bounded diagnostic view of the store.
#[derive(Debug, Clone, Serialize)]
pub struct CacheDetail {
    pub stats: CacheStats,
    pub recent_entries: Vec<EntrySummary>,
}

/// Summary of a single entry for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub value_preview: String,
    pub remaining_ttl_secs: Option<u64>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
}

/// In-memory response cache with hybrid eviction.
pub struct ResponseCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    memory_usage: AtomicUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    started_at: Instant,
}

impl ResponseCache {
    /// Create a cache with the given configuration and time source.
    ///
    /// The expiry sweep is not started here; the composition root decides
    /// whether to call [`ResponseCache::spawn_sweeper`].
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let config = config.sanitized();
        info!(
            max_entries = config.max_entries,
            max_memory = %format_bytes(config.max_memory_bytes as u64),
            strategy = %config.eviction_strategy,
            "response cache initialized"
        );

        Self {
            config,
            clock,
            entries: RwLock::new(HashMap::new()),
            memory_usage: AtomicUsize::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Store a value under `key` with the default TTL and no tags.
    pub fn set(&self, key: &str, value: impl Into<String>) -> CacheResult<()> {
        self.set_with(key, value, EntryOptions::default())
    }

    /// Store a value under `key`.
    ///
    /// Overwriting an existing entry replaces its value, size, timestamps,
    /// and TTL, and counts as a single `set`. If the insert would exceed a
    /// capacity limit, victims are evicted until headroom exists.
    pub fn set_with(
        &self,
        key: &str,
        value: impl Into<String>,
        options: EntryOptions,
    ) -> CacheResult<()> {
        Self::validate_key(key)?;

        let now = self.clock.now();
        let ttl = options.ttl.or(self.config.default_ttl);
        let tags: HashSet<String> = options.tags.into_iter().collect();
        let entry = CacheEntry::new(value.into(), ttl, tags, now);

        if entry.size_bytes > self.config.max_memory_bytes {
            // The value alone cannot fit under the memory ceiling; storing it
            // would either break the ceiling or empty the cache for nothing.
            warn!(
                key,
                size = %format_bytes(entry.size_bytes as u64),
                ceiling = %format_bytes(self.config.max_memory_bytes as u64),
                "value larger than cache memory ceiling, not cached"
            );
            return Ok(());
        }

        let mut entries = self.entries.write();

        if let Some(old) = entries.remove(key) {
            self.memory_usage.fetch_sub(old.size_bytes, Ordering::Relaxed);
        }

        while entries.len() >= self.config.max_entries
            || self.memory_usage.load(Ordering::Relaxed) + entry.size_bytes
                > self.config.max_memory_bytes
        {
            if !self.evict_one_locked(&mut entries, now) {
                break;
            }
        }

        self.memory_usage.fetch_add(entry.size_bytes, Ordering::Relaxed);
        entries.insert(key.to_string(), entry);
        self.sets.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    /// Look up `key`, returning the value on a live hit.
    ///
    /// `Some`/`None` is the explicit hit/miss signal; callers never need to
    /// infer cache behavior from elapsed time. An expired entry is treated
    /// as absent, removed as a side effect, and counted as a miss.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.write();

        let expired = match entries.get_mut(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.mark_accessed(now);
                let value = entry.value.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(value);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            if let Some(entry) = entries.remove(key) {
                self.memory_usage.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                debug!(key, "expired entry removed on read");
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Remove `key` if present; returns whether something was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        match entries.remove(key) {
            Some(entry) => {
                self.memory_usage.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                self.deletes.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Remove every entry.
    ///
    /// Cumulative counters are left intact: statistics reflect lifetime
    /// activity, not current contents.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        self.memory_usage.store(0, Ordering::Relaxed);
        info!(removed, "cache cleared");
    }

    /// Evict exactly one entry chosen by the configured strategy.
    ///
    /// No-op on an empty store.
    pub fn evict_oldest(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        self.evict_one_locked(&mut entries, now);
    }

    /// Remove every entry tagged with `tag`; returns the removal count.
    ///
    /// Each removal counts as a deletion, not an eviction.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write();
        let keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.tags.contains(tag))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            if let Some(entry) = entries.remove(key) {
                self.memory_usage.fetch_sub(entry.size_bytes, Ordering::Relaxed);
                self.deletes.fetch_add(1, Ordering::Relaxed);
            }
        }

        if !keys.is_empty() {
            debug!(tag, removed = keys.len(), "invalidated entries by tag");
        }
        keys.len()
    }

    /// Remove every expired entry; returns the removal count.
    ///
    /// Sweep removals are TTL-driven reclamation and count as evictions.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut freed = 0usize;
        for key in &expired {
            if let Some(entry) = entries.remove(key) {
                freed += entry.size_bytes;
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        if !expired.is_empty() {
            self.memory_usage.fetch_sub(freed, Ordering::Relaxed);
            debug!(
                removed = expired.len(),
                freed = %format_bytes(freed as u64),
                "expiry sweep"
            );
        }
        expired.len()
    }

    /// Spawn the periodic expiry sweep task.
    ///
    /// The returned handle keeps the task abortable at shutdown.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        let sweep_interval = cache.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                cache.sweep_expired();
            }
        })
    }

    /// Assemble the lifetime statistics shape.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let memory_usage = self.memory_usage.load(Ordering::Relaxed) as u64;
        let uptime_secs = self.started_at.elapsed().as_secs();

        CacheStats {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            hit_rate: CacheStats::hit_rate(hits, misses),
            entry_count: self.entries.read().len(),
            memory_usage,
            memory_usage_formatted: format_bytes(memory_usage),
            max_memory: self.config.max_memory_bytes as u64,
            max_memory_formatted: format_bytes(self.config.max_memory_bytes as u64),
            max_size: self.config.max_entries,
            uptime_secs,
            uptime_formatted: format_uptime(uptime_secs),
            eviction_strategy: self.config.eviction_strategy.to_string(),
            error: None,
        }
    }

    /// Statistics plus a bounded, most-recent-first list of entry summaries.
    pub fn detailed_info(&self) -> CacheDetail {
        let now = self.clock.now();
        let entries = self.entries.read();

        let mut summaries: Vec<EntrySummary> = entries
            .iter()
            .map(|(key, entry)| EntrySummary {
                key: key.clone(),
                value_preview: preview(&entry.value),
                remaining_ttl_secs: entry.remaining_ttl(now).map(|d| d.as_secs()),
                last_accessed: entry.last_accessed,
                access_count: entry.access_count,
            })
            .collect();
        drop(entries);

        summaries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        summaries.truncate(RECENT_ENTRIES_CAP);

        CacheDetail {
            stats: self.stats(),
            recent_entries: summaries,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Current estimated memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage.load(Ordering::Relaxed)
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read-only access to the entry map for snapshot export.
    pub(crate) fn with_entries<R>(&self, f: impl FnOnce(&HashMap<String, CacheEntry>) -> R) -> R {
        f(&self.entries.read())
    }

    fn validate_key(key: &str) -> CacheResult<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey {
                message: "cache key cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Evict a single victim under an already-held write lock.
    ///
    /// Returns whether a victim was removed.
    fn evict_one_locked(
        &self,
        entries: &mut HashMap<String, CacheEntry>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(victim) = self.config.eviction_strategy.select_victim(entries, now) else {
            return false;
        };

        if let Some(entry) = entries.remove(&victim) {
            self.memory_usage.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(
                key = %victim,
                freed = %format_bytes(entry.size_bytes as u64),
                strategy = %self.config.eviction_strategy,
                "evicted entry"
            );
            true
        } else {
            false
        }
    }
}

fn preview(value: &str) -> String {
    if value.chars().count() <= VALUE_PREVIEW_CHARS {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(VALUE_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;

    fn manual_cache(config: CacheConfig) -> (ResponseCache, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let cache = ResponseCache::new(config, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_set_get_delete_roundtrip() {
        let (cache, _clock) = manual_cache(CacheConfig::default());

        cache.set("greeting", "hello").unwrap();
        assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
        assert!(cache.delete("greeting"));
        assert!(!cache.delete("greeting"));
        assert_eq!(cache.get("greeting"), None);
    }

    #[test]
    fn test_empty_key_rejected() {
        let (cache, _clock) = manual_cache(CacheConfig::default());
        assert!(matches!(
            cache.set("", "value"),
            Err(CacheError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_ttl_expiry_counts_as_miss_and_removes() {
        let (cache, clock) = manual_cache(CacheConfig::default());

        cache
            .set_with(
                "short",
                "lived",
                EntryOptions {
                    ttl: Some(Duration::from_secs(5)),
                    tags: Vec::new(),
                },
            )
            .unwrap();

        clock.advance(Duration::from_secs(4));
        assert_eq!(cache.get("short").as_deref(), Some("lived"));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.len(), 0);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_overwrite_counts_one_set_and_swaps_size() {
        let (cache, _clock) = manual_cache(CacheConfig::default());

        cache.set("k", "a".repeat(100)).unwrap();
        let first_usage = cache.memory_usage();
        cache.set("k", "b").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.sets, 2);
        assert_eq!(stats.deletes, 0);
        assert_eq!(cache.len(), 1);
        assert!(cache.memory_usage() < first_usage);
        assert_eq!(cache.get("k").as_deref(), Some("b"));
    }

    #[test]
    fn test_entry_capacity_enforced() {
        let (cache, _clock) = manual_cache(CacheConfig {
            max_entries: 3,
            ..Default::default()
        });

        for i in 0..10 {
            cache.set(&format!("key-{}", i), "value").unwrap();
        }

        assert!(cache.len() <= 3);
        assert!(cache.stats().evictions >= 7);
    }

    #[test]
    fn test_memory_capacity_enforced() {
        let (cache, _clock) = manual_cache(CacheConfig {
            max_memory_bytes: 4096,
            ..Default::default()
        });

        for i in 0..50 {
            cache.set(&format!("key-{}", i), "x".repeat(500)).unwrap();
        }

        assert!(cache.memory_usage() <= 4096);
    }

    #[test]
    fn test_oversized_value_not_cached() {
        let (cache, _clock) = manual_cache(CacheConfig {
            max_memory_bytes: 512,
            ..Default::default()
        });

        cache.set("small", "fits").unwrap();
        cache.set("huge", "x".repeat(100_000)).unwrap();

        assert_eq!(cache.get("huge"), None);
        assert_eq!(cache.get("small").as_deref(), Some("fits"));
        assert!(cache.memory_usage() <= 512);
    }

    #[test]
    fn test_eviction_prefers_expired_entry() {
        let (cache, clock) = manual_cache(CacheConfig::default());

        cache
            .set_with(
                "expired",
                "stale",
                EntryOptions {
                    ttl: Some(Duration::from_secs(1)),
                    tags: Vec::new(),
                },
            )
            .unwrap();
        cache.set("lru", "old but live").unwrap();

        clock.advance(Duration::from_secs(10));
        // Touch the live entry so it is not the LRU candidate either way.
        cache.set("fresh", "new").unwrap();

        cache.evict_oldest();

        assert_eq!(cache.len(), 2);
        let entries: Vec<String> =
            cache.with_entries(|map| map.keys().cloned().collect());
        assert!(!entries.contains(&"expired".to_string()));
    }

    #[test]
    fn test_evict_oldest_on_empty_store_is_noop() {
        let (cache, _clock) = manual_cache(CacheConfig::default());
        cache.evict_oldest();
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_clear_keeps_lifetime_counters() {
        let (cache, _clock) = manual_cache(CacheConfig::default());

        cache.set("a", "1").unwrap();
        cache.get("a");
        cache.get("missing");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.memory_usage, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
    }

    #[test]
    fn test_invalidate_by_tag() {
        let (cache, _clock) = manual_cache(CacheConfig::default());

        let tagged = EntryOptions {
            ttl: None,
            tags: vec!["user:42".to_string()],
        };
        cache.set_with("a", "1", tagged.clone()).unwrap();
        cache.set_with("b", "2", tagged).unwrap();
        cache.set("c", "3").unwrap();

        let removed = cache.invalidate_by_tag("user:42");

        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.deletes, 2);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (cache, clock) = manual_cache(CacheConfig::default());

        cache
            .set_with(
                "dies",
                "soon",
                EntryOptions {
                    ttl: Some(Duration::from_secs(30)),
                    tags: Vec::new(),
                },
            )
            .unwrap();
        cache
            .set_with(
                "lives",
                "long",
                EntryOptions {
                    ttl: Some(Duration::from_secs(600)),
                    tags: Vec::new(),
                },
            )
            .unwrap();

        clock.advance(Duration::from_secs(60));
        let removed = cache.sweep_expired();

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_detailed_info_is_bounded_and_recent_first() {
        let (cache, clock) = manual_cache(CacheConfig::default());

        for i in 0..40 {
            cache.set(&format!("key-{}", i), "v").unwrap();
            clock.advance(Duration::from_secs(1));
        }
        cache.get("key-0");

        let detail = cache.detailed_info();
        assert_eq!(detail.recent_entries.len(), RECENT_ENTRIES_CAP);
        // key-0 was just read, so it leads the most-recent-first list.
        assert_eq!(detail.recent_entries[0].key, "key-0");
    }

    #[test]
    fn test_value_preview_truncated() {
        let (cache, _clock) = manual_cache(CacheConfig::default());
        cache.set("long", "x".repeat(500)).unwrap();

        let detail = cache.detailed_info();
        let summary = &detail.recent_entries[0];
        assert!(summary.value_preview.len() <= VALUE_PREVIEW_CHARS + 3);
        assert!(summary.value_preview.ends_with("..."));
    }

    #[test]
    fn test_sanitized_config_replaces_zeros() {
        let config = CacheConfig {
            max_entries: 0,
            max_memory_bytes: 0,
            sweep_interval: Duration::ZERO,
            ..Default::default()
        }
        .sanitized();

        let defaults = CacheConfig::default();
        assert_eq!(config.max_entries, defaults.max_entries);
        assert_eq!(config.max_memory_bytes, defaults.max_memory_bytes);
        assert_eq!(config.sweep_interval, defaults.sweep_interval);
    }
}
