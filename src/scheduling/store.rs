//! # Reminder Store Boundary
//!
//! The scheduler treats reminder persistence as a transactional black box:
//! it never assumes in-process exclusivity and always re-confirms state from
//! the boolean results here rather than trusting its own cached belief about
//! a record's status. Backends implement [`ReminderStore`];
//! [`MemoryReminderStore`] is the in-process implementation used as the
//! default store and as the test double.

use super::record::{NewReminder, ReminderRecord, ReminderStatus};
use super::{SchedulerError, SchedulerResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Persistent store for reminder records.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// All records currently in `Active` status.
    async fn get_active_reminders(&self) -> SchedulerResult<Vec<ReminderRecord>>;

    /// Persist a new reminder and return it with its assigned id.
    async fn create_reminder(&self, reminder: NewReminder) -> SchedulerResult<ReminderRecord>;

    /// Mark an `Active` record `Completed`.
    ///
    /// Returns `false` when no active row matched — the record was already
    /// resolved by another path.
    async fn complete_reminder(&self, id: i64) -> SchedulerResult<bool>;

    /// Mark an `Active` record owned by `user_id` as `Cancelled`.
    async fn cancel_reminder(&self, id: i64, user_id: &str) -> SchedulerResult<bool>;

    /// Remove a record owned by `user_id` from any status.
    async fn delete_reminder(&self, id: i64, user_id: &str) -> SchedulerResult<bool>;

    /// Records for `user_id`, optionally including resolved ones.
    async fn get_user_reminders(
        &self,
        user_id: &str,
        include_completed: bool,
    ) -> SchedulerResult<Vec<ReminderRecord>>;
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    next_id: i64,
    rows: BTreeMap<i64, ReminderRecord>,
}

/// In-memory reminder store with sequential ids.
#[derive(Debug, Default)]
pub struct MemoryReminderStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a record by id regardless of owner or status.
    pub fn record(&self, id: i64) -> Option<ReminderRecord> {
        self.inner.lock().rows.get(&id).cloned()
    }
}

#[async_trait]
impl ReminderStore for MemoryReminderStore {
    async fn get_active_reminders(&self) -> SchedulerResult<Vec<ReminderRecord>> {
        let inner = self.inner.lock();
        Ok(inner
            .rows
            .values()
            .filter(|r| r.status == ReminderStatus::Active)
            .cloned()
            .collect())
    }

    async fn create_reminder(&self, reminder: NewReminder) -> SchedulerResult<ReminderRecord> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;

        let record = ReminderRecord {
            id,
            user_id: reminder.user_id,
            message: reminder.message,
            scheduled_time: reminder.scheduled_time,
            timezone: reminder.timezone,
            channel_id: reminder.channel_id,
            server_id: reminder.server_id,
            status: ReminderStatus::Active,
        };
        inner.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn complete_reminder(&self, id: i64) -> SchedulerResult<bool> {
        let mut inner = self.inner.lock();
        match inner.rows.get_mut(&id) {
            Some(row) if row.status == ReminderStatus::Active => {
                row.status = ReminderStatus::Completed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_reminder(&self, id: i64, user_id: &str) -> SchedulerResult<bool> {
        let mut inner = self.inner.lock();
        match inner.rows.get_mut(&id) {
            Some(row) if row.status == ReminderStatus::Active && row.user_id == user_id => {
                row.status = ReminderStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_reminder(&self, id: i64, user_id: &str) -> SchedulerResult<bool> {
        let mut inner = self.inner.lock();
        let owned = inner
            .rows
            .get(&id)
            .map_or(false, |row| row.user_id == user_id);
        if owned {
            inner.rows.remove(&id);
        }
        Ok(owned)
    }

    async fn get_user_reminders(
        &self,
        user_id: &str,
        include_completed: bool,
    ) -> SchedulerResult<Vec<ReminderRecord>> {
        let inner = self.inner.lock();
        Ok(inner
            .rows
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| include_completed || r.status == ReminderStatus::Active)
            .cloned()
            .collect())
    }
}

/// Store that fails every write, for exercising storage-error paths.
pub struct FailingReminderStore;

#[async_trait]
impl ReminderStore for FailingReminderStore {
    async fn get_active_reminders(&self) -> SchedulerResult<Vec<ReminderRecord>> {
        Ok(Vec::new())
    }

    async fn create_reminder(&self, _reminder: NewReminder) -> SchedulerResult<ReminderRecord> {
        Err(SchedulerError::Store {
            message: "insert failed".to_string(),
        })
    }

    async fn complete_reminder(&self, _id: i64) -> SchedulerResult<bool> {
        Err(SchedulerError::Store {
            message: "update failed".to_string(),
        })
    }

    async fn cancel_reminder(&self, _id: i64, _user_id: &str) -> SchedulerResult<bool> {
        Err(SchedulerError::Store {
            message: "update failed".to_string(),
        })
    }

    async fn delete_reminder(&self, _id: i64, _user_id: &str) -> SchedulerResult<bool> {
        Err(SchedulerError::Store {
            message: "delete failed".to_string(),
        })
    }

    async fn get_user_reminders(
        &self,
        _user_id: &str,
        _include_completed: bool,
    ) -> SchedulerResult<Vec<ReminderRecord>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(user: &str) -> NewReminder {
        NewReminder::new(user, "water the plants", Utc::now() + chrono::Duration::hours(1))
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryReminderStore::new();
        let first = store.create_reminder(sample("u1")).await.unwrap();
        let second = store.create_reminder(sample("u1")).await.unwrap();

        assert_eq!(first.id + 1, second.id);
        assert_eq!(first.status, ReminderStatus::Active);
    }

    #[tokio::test]
    async fn test_complete_only_touches_active_rows() {
        let store = MemoryReminderStore::new();
        let record = store.create_reminder(sample("u1")).await.unwrap();

        assert!(store.complete_reminder(record.id).await.unwrap());
        // Already completed: no active row matches.
        assert!(!store.complete_reminder(record.id).await.unwrap());
        assert!(!store.complete_reminder(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_requires_owner() {
        let store = MemoryReminderStore::new();
        let record = store.create_reminder(sample("u1")).await.unwrap();

        assert!(!store.cancel_reminder(record.id, "someone-else").await.unwrap());
        assert!(store.cancel_reminder(record.id, "u1").await.unwrap());
        assert_eq!(
            store.record(record.id).unwrap().status,
            ReminderStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_delete_removes_any_status() {
        let store = MemoryReminderStore::new();
        let record = store.create_reminder(sample("u1")).await.unwrap();
        store.cancel_reminder(record.id, "u1").await.unwrap();

        assert!(store.delete_reminder(record.id, "u1").await.unwrap());
        assert!(store.record(record.id).is_none());
        assert!(!store.delete_reminder(record.id, "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_user_reminders_filters_resolved() {
        let store = MemoryReminderStore::new();
        let keep = store.create_reminder(sample("u1")).await.unwrap();
        let done = store.create_reminder(sample("u1")).await.unwrap();
        store.create_reminder(sample("u2")).await.unwrap();
        store.complete_reminder(done.id).await.unwrap();

        let active = store.get_user_reminders("u1", false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);

        let all = store.get_user_reminders("u1", true).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
