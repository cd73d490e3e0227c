//! # Eviction Strategies
//!
//! Victim selection is a pure decision over entry metadata: given every live
//! entry, pick the one to remove. The strategy is chosen at construction
//! time, so the hot path dispatches on an enum variant rather than a string.
//!
//! The default `Hybrid` strategy is a precedence order, not a weighted score:
//! expired entries are always preferred, then the least-recently-used entry,
//! with the lowest access count breaking last-access ties from burst inserts.
//! Pure LRU starves low-frequency-but-recent entries and pure LFU starves
//! cold-start entries; the expired-first rule keeps TTL correctness ahead of
//! either signal.

use super::entry::CacheEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Eviction strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvictionStrategy {
    /// Expired-first, then LRU, then lowest access count on a tie.
    Hybrid,

    /// Least recently used.
    Lru,

    /// Least frequently used.
    Lfu,

    /// Closest to (or furthest past) its expiry deadline.
    TtlOnly,

    /// Largest estimated footprint first.
    LargestFirst,
}

impl Default for EvictionStrategy {
    fn default() -> Self {
        Self::Hybrid
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hybrid => "hybrid",
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::TtlOnly => "ttl-only",
            Self::LargestFirst => "largest-first",
        };
        write!(f, "{}", name)
    }
}

impl EvictionStrategy {
    /// Select a single victim key, or `None` when the entry set is empty.
    ///
    /// The caller treats `None` as a no-op, never an error.
    pub fn select_victim(
        &self,
        entries: &HashMap<String, CacheEntry>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if entries.is_empty() {
            return None;
        }

        match self {
            Self::Hybrid => {
                // Expired entries win outright, earliest deadline first so
                // repeated eviction drains them in a stable order.
                let expired = entries
                    .iter()
                    .filter(|(_, e)| e.is_expired(now))
                    .min_by_key(|(key, e)| (e.expires_at(), key.as_str().to_owned()));
                if let Some((key, _)) = expired {
                    return Some(key.clone());
                }

                entries
                    .iter()
                    .min_by_key(|(key, e)| {
                        (e.last_accessed, e.access_count, key.as_str().to_owned())
                    })
                    .map(|(key, _)| key.clone())
            }

            Self::Lru => entries
                .iter()
                .min_by_key(|(key, e)| (e.last_accessed, key.as_str().to_owned()))
                .map(|(key, _)| key.clone()),

            Self::Lfu => entries
                .iter()
                .min_by_key(|(key, e)| (e.access_count, e.last_accessed, key.as_str().to_owned()))
                .map(|(key, _)| key.clone()),

            Self::TtlOnly => entries
                .iter()
                .min_by_key(|(key, e)| {
                    // Entries without a TTL sort last; among them, oldest first.
                    match e.expires_at() {
                        Some(deadline) => (0u8, deadline, key.as_str().to_owned()),
                        None => (1u8, e.created_at, key.as_str().to_owned()),
                    }
                })
                .map(|(key, _)| key.clone()),

            Self::LargestFirst => entries
                .iter()
                .max_by_key(|(key, e)| {
                    (
                        e.size_bytes,
                        std::cmp::Reverse(e.last_accessed),
                        std::cmp::Reverse(key.as_str().to_owned()),
                    )
                })
                .map(|(key, _)| key.clone()),
        }
    }
}
