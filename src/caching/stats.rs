//! # Cache Statistics
//!
//! The statistics shape consumed by display layers (the admin surface, a
//! status command). Every numeric field carries a human-formatted string
//! counterpart, and the error shape keeps the same fields zeroed so a
//! consumer never renders a missing value.

use serde::Serialize;
use std::time::Duration;

/// Cumulative cache statistics.
///
/// Counters are lifetime values: `clear()` empties the store but leaves
/// them intact so operators can see aggregate effectiveness across
/// cache-busting events.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Successful reads.
    pub hits: u64,

    /// Reads that found nothing (including TTL-expired entries).
    pub misses: u64,

    /// Inserts, including overwrites.
    pub sets: u64,

    /// Explicit removals, including tag invalidation.
    pub deletes: u64,

    /// Capacity- or TTL-driven removals.
    pub evictions: u64,

    /// `hits / (hits + misses)`, `0.0` when no reads have happened.
    pub hit_rate: f64,

    /// Live entries right now.
    pub entry_count: usize,

    /// Estimated bytes held right now.
    pub memory_usage: u64,
    pub memory_usage_formatted: String,

    /// Configured memory ceiling.
    pub max_memory: u64,
    pub max_memory_formatted: String,

    /// Configured entry ceiling.
    pub max_size: usize,

    /// Seconds since the store was constructed.
    pub uptime_secs: u64,
    pub uptime_formatted: String,

    /// Name of the configured eviction strategy.
    pub eviction_strategy: String,

    /// Present only on the forced-error shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CacheStats {
    /// Compute the hit rate without ever dividing by zero.
    pub fn hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// The all-zeroes shape returned when statistics cannot be assembled.
    ///
    /// Every field is present with a zero-equivalent value so display layers
    /// never see an absent key; the failure itself rides in `error`.
    pub fn zeroed<S: Into<String>>(strategy: &str, error: S) -> Self {
        Self {
            hits: 0,
            misses: 0,
            sets: 0,
            deletes: 0,
            evictions: 0,
            hit_rate: 0.0,
            entry_count: 0,
            memory_usage: 0,
            memory_usage_formatted: format_bytes(0),
            max_memory: 0,
            max_memory_formatted: format_bytes(0),
            max_size: 0,
            uptime_secs: 0,
            uptime_formatted: format_uptime(0),
            eviction_strategy: strategy.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Render a byte count as a short human string, e.g. `"1.5 MB"`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", value, UNITS[unit])
}

/// Render an uptime in seconds as a human string, e.g. `"2h 5m 3s"`.
pub fn format_uptime(secs: u64) -> String {
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_guards_divide_by_zero() {
        assert_eq!(CacheStats::hit_rate(0, 0), 0.0);
        assert_eq!(CacheStats::hit_rate(3, 1), 0.75);
        assert_eq!(CacheStats::hit_rate(0, 5), 0.0);
        assert_eq!(CacheStats::hit_rate(5, 0), 1.0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_zeroed_shape_has_every_field() {
        let stats = CacheStats::zeroed("hybrid", "lock poisoned");
        let value = serde_json::to_value(&stats).unwrap();
        let object = value.as_object().unwrap();

        for field in [
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
            "error",
        ] {
            assert!(
                !object.get(field).unwrap_or(&serde_json::Value::Null).is_null(),
                "field {} missing or null",
                field
            );
        }
        assert_eq!(object["memory_usage_formatted"], "0 B");
        assert_eq!(object["error"], "lock poisoned");
    }

    #[test]
    fn test_normal_shape_omits_error_field() {
        let mut stats = CacheStats::zeroed("hybrid", "x");
        stats.error = None;
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.as_object().unwrap().get("error").is_none());
    }
}
