//! Reminder records and their status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a reminder.
///
/// The only transitions are `Active → Completed` (timer fired and the store
/// confirmed it) and `Active → Cancelled` (user cancellation). Deletion
/// removes the row outright from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Active,
    Completed,
    Cancelled,
}

/// A persisted reminder.
///
/// Owned by the persistent store; the scheduler holds only a transient timer
/// handle keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    /// Identifier assigned by the persistent store.
    pub id: i64,

    pub user_id: String,
    pub message: String,

    /// Absolute fire deadline.
    pub scheduled_time: DateTime<Utc>,

    /// IANA timezone the user scheduled in; carried for display, the
    /// scheduler compares UTC instants only.
    pub timezone: String,

    pub channel_id: Option<String>,
    pub server_id: Option<String>,

    pub status: ReminderStatus,
}

/// Fields of a reminder before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: String,
    pub message: String,
    pub scheduled_time: DateTime<Utc>,
    pub timezone: String,
    pub channel_id: Option<String>,
    pub server_id: Option<String>,
}

impl NewReminder {
    /// Convenience constructor with no channel/server context.
    pub fn new<U: Into<String>, M: Into<String>>(
        user_id: U,
        message: M,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            scheduled_time,
            timezone: "UTC".to_string(),
            channel_id: None,
            server_id: None,
        }
    }
}
