//! # Reminder Scheduling
//!
//! Timer-based delayed execution over persisted reminder records.
//!
//! ## Architecture
//! 1. **Records and store boundary**: [`ReminderRecord`] lifecycle and the
//!    [`ReminderStore`] trait the persistence backend implements.
//! 2. **Timer registry** ([`TimerRegistry`]): one live handle per reminder,
//!    direct timers within a safe maximum delay and a polling fallback
//!    beyond it.
//! 3. **Scheduler** ([`ReminderScheduler`]): orchestration and the
//!    `reminder_due` event contract.
//! 4. **Event bus** ([`EventBus`]): synchronous in-order delivery with
//!    per-listener isolation.

pub mod events;
pub mod record;
pub mod scheduler;
pub mod store;
pub mod timer;

pub use events::EventBus;
pub use record::{NewReminder, ReminderRecord, ReminderStatus};
pub use scheduler::ReminderScheduler;
pub use store::{FailingReminderStore, MemoryReminderStore, ReminderStore};
pub use timer::{ArmOutcome, TimerConfig, TimerKind, TimerRegistry};

use crate::core::error::ChatError;

/// Scheduler operation result.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The scheduled time is malformed or not in the future.
    #[error("Invalid scheduled time: {reason}")]
    InvalidTime { reason: String },

    /// The persistent reminder store failed.
    #[error("Reminder store error: {message}")]
    Store { message: String },
}

impl From<SchedulerError> for ChatError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::InvalidTime { reason } => {
                ChatError::validation("scheduled_time", reason)
            }
            SchedulerError::Store { message } => ChatError::Storage { message },
        }
    }
}
