//! Integration tests for the response cache: statistics arithmetic,
//! capacity invariants, TTL behavior, key derivation, and snapshot
//! persistence working together.

use chat_gateway::caching::{
    derive_cache_key, load_snapshot, restore_snapshot, save_snapshot, CacheConfig,
    ConversationTurn, EntryOptions, EvictionStrategy, ResponseCache,
};
use chat_gateway::core::clock::ManualClock;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

fn cache_with_clock(config: CacheConfig) -> (ResponseCache, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    let cache = ResponseCache::new(config, Arc::new(clock.clone()));
    (cache, clock)
}

#[test]
fn hit_rate_matches_formula_over_any_sequence() {
    let (cache, _clock) = cache_with_clock(CacheConfig::default());

    let stats = cache.stats();
    assert_eq!(stats.hit_rate, 0.0);

    cache.set("a", "1").unwrap();
    cache.set("b", "2").unwrap();

    for _ in 0..3 {
        cache.get("a");
    }
    cache.get("nope");

    let stats = cache.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
    assert_eq!(
        stats.hit_rate,
        stats.hits as f64 / (stats.hits + stats.misses) as f64
    );
}

#[test]
fn capacity_invariants_hold_after_any_sequence_of_sets() {
    let (cache, _clock) = cache_with_clock(CacheConfig {
        max_entries: 20,
        max_memory_bytes: 16 * 1024,
        ..Default::default()
    });

    for i in 0..500 {
        let value = "x".repeat((i % 17) * 100 + 1);
        cache.set(&format!("key-{}", i), value).unwrap();

        assert!(cache.len() <= 20, "entry count exceeded after set {}", i);
        assert!(
            cache.memory_usage() <= 16 * 1024,
            "memory ceiling exceeded after set {}",
            i
        );
    }
}

#[test]
fn ttl_boundary_is_exact() {
    let (cache, clock) = cache_with_clock(CacheConfig::default());

    cache
        .set_with(
            "k",
            "v",
            EntryOptions {
                ttl: Some(Duration::from_secs(100)),
                tags: Vec::new(),
            },
        )
        .unwrap();

    clock.advance(Duration::from_secs(99));
    assert_eq!(cache.get("k").as_deref(), Some("v"));

    clock.advance(Duration::from_secs(2));
    assert_eq!(cache.get("k"), None);
    // A re-read stays a miss; the entry is gone, not resurrected.
    assert_eq!(cache.get("k"), None);
}

#[test]
fn eviction_precedence_prefers_expired_over_lru() {
    let (cache, clock) = cache_with_clock(CacheConfig {
        eviction_strategy: EvictionStrategy::Hybrid,
        ..Default::default()
    });

    cache
        .set_with(
            "expired",
            "stale",
            EntryOptions {
                ttl: Some(Duration::from_secs(10)),
                tags: Vec::new(),
            },
        )
        .unwrap();
    cache.set("least-recent", "live").unwrap();
    clock.advance(Duration::from_secs(30));
    cache.set("recent", "live").unwrap();
    cache.get("least-recent");

    cache.evict_oldest();

    assert_eq!(cache.get("least-recent").as_deref(), Some("live"));
    assert_eq!(cache.get("recent").as_deref(), Some("live"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn cache_key_determinism_and_sensitivity() {
    let conversation = vec![
        ConversationTurn::new("system", "Be concise."),
        ConversationTurn::new("user", "Summarize this article."),
    ];

    let same = vec![
        ConversationTurn::new("system", "Be concise."),
        ConversationTurn::new("user", "Summarize this article."),
    ];
    assert_eq!(derive_cache_key(&conversation), derive_cache_key(&same));

    let mut different = conversation.clone();
    different[0].content.push('!');
    assert_ne!(derive_cache_key(&conversation), derive_cache_key(&different));

    assert_eq!(derive_cache_key(&[]), "");
}

#[test]
fn derived_keys_address_the_store() {
    let (cache, _clock) = cache_with_clock(CacheConfig::default());

    let conversation = vec![ConversationTurn::new("user", "What is Rust?")];
    let key = derive_cache_key(&conversation);

    // Miss, upstream call happens out of band, result is cached.
    assert_eq!(cache.get(&key), None);
    cache.set(&key, "Rust is a systems language.").unwrap();

    // The same conversation later is a hit.
    let key_again = derive_cache_key(&conversation);
    assert_eq!(
        cache.get(&key_again).as_deref(),
        Some("Rust is a systems language.")
    );
}

#[test]
fn stats_fields_are_always_present() {
    let (cache, _clock) = cache_with_clock(CacheConfig::default());
    cache.set("a", "1").unwrap();
    cache.get("a");

    let expected_fields = [
        "hits",
        "misses",
        "sets",
        "deletes",
        "evictions",
        "hit_rate",
        "entry_count",
        "memory_usage",
        "memory_usage_formatted",
        "max_memory",
        "max_memory_formatted",
        "max_size",
        "uptime_secs",
        "uptime_formatted",
        "eviction_strategy",
    ];

    // Normal shape.
    let normal = serde_json::to_value(cache.stats()).unwrap();
    for field in expected_fields {
        assert!(
            !normal[field].is_null(),
            "field {} missing from normal stats",
            field
        );
    }

    // Forced-error shape: zeroed values, error message attached.
    let degraded = serde_json::to_value(chat_gateway::CacheStats::zeroed(
        "hybrid",
        "stats unavailable",
    ))
    .unwrap();
    for field in expected_fields {
        assert!(
            !degraded[field].is_null(),
            "field {} missing from degraded stats",
            field
        );
    }
    assert_eq!(degraded["error"], "stats unavailable");
    assert_eq!(degraded["memory_usage_formatted"], "0 B");
}

#[test]
fn clear_preserves_lifetime_statistics() {
    let (cache, _clock) = cache_with_clock(CacheConfig::default());

    cache.set("a", "1").unwrap();
    cache.get("a");
    cache.get("missing");
    cache.clear();
    cache.clear();

    let stats = cache.stats();
    assert_eq!(stats.entry_count, 0);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.json");

    {
        let (cache, _clock) = cache_with_clock(CacheConfig::default());
        cache.set("conv-1", "first answer").unwrap();
        cache.set("conv-2", "second answer").unwrap();
        save_snapshot(&cache, &path).unwrap();
    }

    let (revived, _clock) = cache_with_clock(CacheConfig::default());
    let restored = restore_snapshot(&revived, load_snapshot(&path));

    assert_eq!(restored, 2);
    assert_eq!(revived.get("conv-1").as_deref(), Some("first answer"));

    // Restored entries went through the normal set path: they count as sets.
    assert_eq!(revived.stats().sets, 2);
}

#[test]
fn corrupt_snapshot_means_empty_cache_not_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.json");
    std::fs::write(&path, "{ definitely not json").unwrap();

    let (cache, _clock) = cache_with_clock(CacheConfig::default());
    let restored = restore_snapshot(&cache, load_snapshot(&path));

    assert_eq!(restored, 0);
    assert!(cache.is_empty());
}
