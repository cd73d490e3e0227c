//! # Reminder Scheduler
//!
//! Orchestrates the timer registry against the persistent reminder store:
//! load-all-and-arm on startup, arm-on-create, disarm-on-cancel/delete, and
//! fire-and-mark-complete on due, emitting a `reminder_due` event for each
//! confirmed completion.
//!
//! Ordering rules that matter here:
//! - `cancel`/`delete` disarm the timer before touching the store. If the
//!   process dies between the two, the worst case is an `active` row that
//!   never fires (recoverable by a later reconciliation), never a
//!   double-fire.
//! - A past-due record found during load is completed synchronously, not via
//!   a zero-delay timer, so a racing shutdown cannot drop it.
//! - `fire` trusts only the store's row-changed result: a record completed
//!   or cancelled by a concurrent path is a non-fatal miss and emits
//!   nothing.

use super::events::EventBus;
use super::record::{NewReminder, ReminderRecord, ReminderStatus};
use super::store::ReminderStore;
use super::timer::{ArmOutcome, TimerConfig, TimerKind, TimerRegistry};
use super::{SchedulerError, SchedulerResult};
use crate::core::clock::Clock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Timer-driven reminder scheduler.
///
/// Constructed once at the composition root and shared by reference; all
/// state lives behind `&self`.
pub struct ReminderScheduler {
    store: Arc<dyn ReminderStore>,
    timers: TimerRegistry,
    events: EventBus<ReminderRecord>,
    clock: Arc<dyn Clock>,
    initialized: AtomicBool,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        config: TimerConfig,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            timers: TimerRegistry::new(config, Arc::clone(&clock)),
            events: EventBus::new("reminder_due"),
            clock,
            initialized: AtomicBool::new(false),
        })
    }

    /// Subscribe to confirmed reminder completions.
    ///
    /// Delivery is at-least-once per successful completion: never zero,
    /// never duplicated for the same fire.
    pub fn on_reminder_due<F>(&self, listener: F)
    where
        F: Fn(&ReminderRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe(listener);
    }

    /// Fetch all active records and arm a timer for each.
    ///
    /// Records whose deadline has already elapsed are completed through the
    /// store right here, synchronously, rather than armed.
    pub async fn load_and_arm_all(self: &Arc<Self>) -> SchedulerResult<usize> {
        let records = self.store.get_active_reminders().await?;
        let total = records.len();
        let mut armed = 0usize;

        for record in records {
            if self.arm_record(record).await {
                armed += 1;
            }
        }

        self.initialized.store(true, Ordering::SeqCst);
        info!(total, armed, "reminders loaded");
        Ok(armed)
    }

    /// Validate and persist a new reminder, then arm it.
    ///
    /// Fails with a validation error when the scheduled time is not in the
    /// future; storage failures abort the operation and bubble up.
    pub async fn create(self: &Arc<Self>, reminder: NewReminder) -> SchedulerResult<ReminderRecord> {
        if reminder.scheduled_time <= self.clock.now() {
            return Err(SchedulerError::InvalidTime {
                reason: "scheduled time must be in the future".to_string(),
            });
        }

        let record = self.store.create_reminder(reminder).await?;
        debug!(id = record.id, user = %record.user_id, "reminder created");
        self.arm_record(record.clone()).await;
        Ok(record)
    }

    /// Cancel an active reminder owned by `user_id`.
    ///
    /// The timer is disarmed first, unconditionally — a dangling timer must
    /// not outlive a logically-gone reminder even if the store call fails.
    pub async fn cancel(&self, id: i64, user_id: &str) -> SchedulerResult<bool> {
        self.timers.disarm(id);
        self.store.cancel_reminder(id, user_id).await
    }

    /// Permanently delete a reminder owned by `user_id`.
    pub async fn delete(&self, id: i64, user_id: &str) -> SchedulerResult<bool> {
        self.timers.disarm(id);
        self.store.delete_reminder(id, user_id).await
    }

    /// Records for `user_id`, optionally including resolved ones.
    pub async fn reminders_for(
        &self,
        user_id: &str,
        include_completed: bool,
    ) -> SchedulerResult<Vec<ReminderRecord>> {
        self.store.get_user_reminders(user_id, include_completed).await
    }

    /// Disarm every live timer and mark the scheduler uninitialized.
    ///
    /// Idempotent; safe to call repeatedly or with nothing armed.
    pub fn shutdown(&self) {
        self.timers.disarm_all();
        if self.initialized.swap(false, Ordering::SeqCst) {
            info!("reminder scheduler shut down");
        }
    }

    /// Whether `load_and_arm_all` has run and `shutdown` has not.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Number of live timers; diagnostics only.
    pub fn armed_count(&self) -> usize {
        self.timers.armed_count()
    }

    /// Kind of the live timer for `id`, if any; diagnostics only.
    pub fn armed_kind(&self, id: i64) -> Option<TimerKind> {
        self.timers.armed_kind(id)
    }

    /// Arm a timer for `record`; past-due records are completed immediately.
    ///
    /// Returns whether a timer was armed.
    async fn arm_record(self: &Arc<Self>, record: ReminderRecord) -> bool {
        let id = record.id;
        let deadline = record.scheduled_time;
        let scheduler = Arc::clone(self);
        let fire_record = record.clone();

        match self.timers.arm(id, deadline, move || async move {
            scheduler.fire(fire_record).await;
        }) {
            ArmOutcome::Armed(_) => true,
            ArmOutcome::PastDue => {
                debug!(id, "reminder already due at arm time");
                self.complete_and_emit(record).await;
                false
            }
        }
    }

    /// Mark `record` complete in the store; emit only on a confirmed change.
    async fn fire(self: Arc<Self>, record: ReminderRecord) {
        // The registry self-cleans on fire, but that is its contract, not
        // ours: disarm again so a stale handle can never linger.
        self.timers.disarm(record.id);
        self.complete_and_emit(record).await;
    }

    async fn complete_and_emit(&self, record: ReminderRecord) {
        match self.store.complete_reminder(record.id).await {
            Ok(true) => {
                let completed = ReminderRecord {
                    status: ReminderStatus::Completed,
                    ..record
                };
                debug!(id = completed.id, "reminder completed");
                self.events.publish(&completed);
            }
            Ok(false) => {
                warn!(
                    id = record.id,
                    "reminder was already resolved elsewhere, no event emitted"
                );
            }
            Err(e) => {
                warn!(id = record.id, error = %e, "failed to complete reminder");
            }
        }
    }
}
