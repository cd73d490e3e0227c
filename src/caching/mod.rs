//! # Response Caching
//!
//! In-process cache for upstream LLM responses with hybrid eviction.
//!
//! ## Architecture
//! 1. **Store** ([`ResponseCache`]): the keyed store with TTL expiry,
//!    memory/count accounting, and lifetime statistics.
//! 2. **Eviction** ([`EvictionStrategy`]): pure victim selection, chosen at
//!    construction time.
//! 3. **Key derivation** ([`derive_cache_key`]): deterministic SHA-256
//!    fingerprint of a conversation, used by callers to address the store.
//! 4. **Persistence**: optional best-effort JSON snapshot across restarts.
//!
//! A caller derives a key from the conversation, asks the store for a hit,
//! and on a miss performs the expensive upstream call and stores the result.

pub mod entry;
pub mod eviction;
pub mod key;
pub mod persistence;
pub mod stats;
pub mod store;

pub use entry::CacheEntry;
pub use eviction::EvictionStrategy;
pub use key::{derive_cache_key, ConversationTurn};
pub use persistence::{load_snapshot, restore_snapshot, save_snapshot, CacheSnapshot};
pub use stats::{format_bytes, format_uptime, CacheStats};
pub use store::{CacheConfig, CacheDetail, EntryOptions, EntrySummary, ResponseCache};

use crate::core::error::ChatError;

/// Cache operation result.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid cache key: {message}")]
    InvalidKey { message: String },

    #[error("Snapshot error: {message}")]
    Snapshot { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CacheError> for ChatError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidKey { message } => ChatError::validation("key", &message),
            CacheError::Snapshot { message } => ChatError::Io { message },
            CacheError::Serialization(e) => ChatError::Json {
                message: e.to_string(),
            },
        }
    }
}
