//! # Timer Registry
//!
//! Maps a reminder id to one live delayed-execution handle. A platform
//! timer is only trusted for delays up to a safe maximum (24 hours here);
//! beyond that the registry falls back to a polling timer that wakes every
//! minute and compares the wall clock against the deadline.
//!
//! Handles are stored in exactly one tagged shape. Arming an id that is
//! already armed replaces the old handle (never double-fires), and a fired
//! task removes its own registry entry before running the callback.

use crate::core::clock::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timer subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Longest delay a single direct timer may carry.
    #[serde(with = "humantime_serde")]
    pub max_direct_delay: Duration,

    /// Wake interval of the polling fallback.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_direct_delay: Duration::from_secs(24 * 60 * 60),
            poll_interval: Duration::from_secs(60),
        }
    }
}

impl TimerConfig {
    /// Replace out-of-range values with the documented defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.max_direct_delay.is_zero() {
            warn!(
                "scheduler.max_direct_delay of 0 is invalid, using default {:?}",
                defaults.max_direct_delay
            );
            self.max_direct_delay = defaults.max_direct_delay;
        }
        if self.poll_interval.is_zero() {
            warn!(
                "scheduler.poll_interval of 0 is invalid, using default {:?}",
                defaults.poll_interval
            );
            self.poll_interval = defaults.poll_interval;
        }

        self
    }
}

/// The two timer classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Native delay that fires once at the deadline.
    Direct,

    /// Periodic wake that checks the clock against the deadline.
    Polling,
}

/// Result of an [`TimerRegistry::arm`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// A timer of the given kind is now live.
    Armed(TimerKind),

    /// The deadline has already elapsed; nothing was armed. The caller is
    /// expected to invoke completion immediately instead.
    PastDue,
}

struct TimerHandle {
    kind: TimerKind,
    /// Generation token; a fired task only removes the registry entry if it
    /// still belongs to this generation, so a concurrent re-arm is never
    /// clobbered.
    token: u64,
    task: tokio::task::JoinHandle<()>,
}

/// Registry of live timers, keyed by reminder id.
pub struct TimerRegistry {
    config: TimerConfig,
    clock: Arc<dyn Clock>,
    timers: Arc<Mutex<HashMap<i64, TimerHandle>>>,
    next_token: AtomicU64,
}

impl TimerRegistry {
    pub fn new(config: TimerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: config.sanitized(),
            clock,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(0),
        }
    }

    /// Arm a timer for `id` firing `on_fire` at `deadline`.
    ///
    /// A live handle for the same id is disarmed first (replace semantics).
    /// A deadline at or before the current time arms nothing and returns
    /// [`ArmOutcome::PastDue`].
    pub fn arm<F, Fut>(&self, id: i64, deadline: DateTime<Utc>, on_fire: F) -> ArmOutcome
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.disarm(id);

        let now = self.clock.now();
        let delay = match (deadline - now).to_std() {
            Ok(delay) if !delay.is_zero() => delay,
            _ => return ArmOutcome::PastDue,
        };

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.timers);

        // The entry must be inserted before the spawned task can race to
        // remove it, so the map lock is held across spawn + insert.
        let mut timers = self.timers.lock();

        let (kind, task) = if delay <= self.config.max_direct_delay {
            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                remove_if_current(&registry, id, token);
                on_fire().await;
            });
            (TimerKind::Direct, task)
        } else {
            let clock = Arc::clone(&self.clock);
            let poll_interval = self.config.poll_interval;
            let task = tokio::spawn(async move {
                let mut interval = tokio::time::interval(poll_interval);
                interval.tick().await; // first tick completes immediately
                loop {
                    interval.tick().await;
                    if clock.now() >= deadline {
                        break;
                    }
                }
                remove_if_current(&registry, id, token);
                on_fire().await;
            });
            (TimerKind::Polling, task)
        };

        timers.insert(id, TimerHandle { kind, token, task });
        debug!(id, ?kind, %deadline, "timer armed");
        ArmOutcome::Armed(kind)
    }

    /// Cancel and remove the handle for `id` if present; no-op otherwise.
    pub fn disarm(&self, id: i64) {
        if let Some(handle) = self.timers.lock().remove(&id) {
            handle.task.abort();
            debug!(id, kind = ?handle.kind, "timer disarmed");
        }
    }

    /// Cancel every live handle. Used at shutdown so no dangling timer
    /// keeps the process alive.
    pub fn disarm_all(&self) {
        let handles: Vec<(i64, TimerHandle)> = self.timers.lock().drain().collect();
        let count = handles.len();
        for (_, handle) in handles {
            handle.task.abort();
        }
        if count > 0 {
            info!(count, "all timers disarmed");
        }
    }

    /// Kind of the live handle for `id`, if any.
    pub fn armed_kind(&self, id: i64) -> Option<TimerKind> {
        self.timers.lock().get(&id).map(|h| h.kind)
    }

    /// Number of live handles.
    pub fn armed_count(&self) -> usize {
        self.timers.lock().len()
    }
}

/// Remove the registry entry for `id` only if it still belongs to the
/// generation that fired.
fn remove_if_current(timers: &Mutex<HashMap<i64, TimerHandle>>, id: i64, token: u64) {
    let mut map = timers.lock();
    if map.get(&id).map(|h| h.token) == Some(token) {
        map.remove(&id);
    }
}
