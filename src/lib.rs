//! # Chat Gateway Library
//!
//! The caching and reminder-scheduling core of an LLM chat assistant
//! gateway. The gateway proxies chat messages to an upstream LLM provider;
//! this crate owns the two stateful subsystems around that proxying:
//!
//! - **Response caching** (`caching`): an in-process keyed store with
//!   hybrid (expired-first / LRU / LFU-tie-break) eviction, TTL expiry,
//!   memory and count ceilings, deterministic conversation fingerprinting,
//!   lifetime statistics, and optional snapshot persistence.
//! - **Reminder scheduling** (`scheduling`): timer-based delayed execution
//!   over persisted reminder records, with a polling fallback for delays a
//!   single native timer cannot safely carry, crash-safe reload at startup,
//!   and a `reminder_due` event contract for delivery layers.
//!
//! Everything else a deployed gateway needs — Discord command dispatch, the
//! upstream HTTP client, the SQL schema — lives behind the boundary traits
//! here (`scheduling::ReminderStore`, the stats shape) and is supplied by
//! the embedding application.
//!
//! Services are constructed explicitly at the composition root (`main.rs`
//! for the binary) and shared by `Arc`; there are no module-level
//! singletons.

/// Errors, configuration, and the time source.
pub mod core;

/// In-process response cache with hybrid eviction.
pub mod caching;

/// Reminder scheduling: timers, records, store boundary, events.
pub mod scheduling;

/// Admin/status HTTP surface.
pub mod admin;

/// Structured logging setup.
pub mod observability;

pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::AppConfig;
pub use crate::core::error::{ChatError, ChatResult};

pub use caching::{
    derive_cache_key, CacheConfig, CacheStats, ConversationTurn, EntryOptions, EvictionStrategy,
    ResponseCache,
};
pub use scheduling::{
    MemoryReminderStore, NewReminder, ReminderRecord, ReminderScheduler, ReminderStatus,
    ReminderStore, TimerConfig, TimerKind,
};
