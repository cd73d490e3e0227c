//! Cache entry metadata and lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// A single cached response with the metadata the eviction policy reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached value.
    pub value: String,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,

    /// Last access timestamp.
    pub last_accessed: DateTime<Utc>,

    /// Number of times this entry has been read.
    pub access_count: u64,

    /// Time-to-live; `None` means the entry never expires on its own.
    pub ttl: Option<Duration>,

    /// Estimated memory footprint in bytes, computed at insertion.
    pub size_bytes: usize,

    /// Tags for group invalidation.
    pub tags: HashSet<String>,
}

impl CacheEntry {
    /// Create a new entry; the size estimate covers the value, the tag
    /// strings, and the struct itself.
    pub fn new(
        value: String,
        ttl: Option<Duration>,
        tags: HashSet<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let size_bytes = value.len()
            + tags.iter().map(|t| t.len()).sum::<usize>()
            + std::mem::size_of::<Self>();

        Self {
            value,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            ttl,
            size_bytes,
            tags,
        }
    }

    /// Check whether the entry is past its TTL at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok()) {
            Some(ttl) => now - self.created_at > ttl,
            None => false,
        }
    }

    /// The instant this entry expires, if it has a TTL.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| self.created_at + ttl)
    }

    /// Remaining lifetime at `now`; zero once expired.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at()
            .map(|deadline| (deadline - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Record a successful read.
    pub fn mark_accessed(&mut self, now: DateTime<Utc>) {
        self.access_count += 1;
        self.last_accessed = now;
    }
}
