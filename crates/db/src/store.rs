//! The reminder store: every read and write the reminder engine needs.
//!
//! Both producers (the dispatch orchestrator on the server, the mirror in
//! the client) are written against [`ReminderStore`], so the same logic
//! runs against Postgres ([`PgReminderStore`]) or the in-memory store used
//! in tests and offline development.

use async_trait::async_trait;
use satprep_core::types::{DbId, Timestamp};

use crate::models::cron_log::NewCronLog;
use crate::models::daily_log::DailyLog;
use crate::models::notification::{NewNotification, Notification};
use crate::models::study_plan::StudyPlan;
use crate::models::user::User;
use crate::models::user_profile::UserProfile;
use crate::repositories::{
    CronLogRepo, DailyLogRepo, NotificationRepo, StudyPlanRepo, UserActivityRepo,
    UserProfileRepo, UserRepo,
};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> StoreResult<()>;

    /// Every user in the directory.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn find_user(&self, user_id: DbId) -> StoreResult<Option<User>>;

    /// A user's plans dated `date` (`YYYY-MM-DD`).
    async fn plans_for_date(&self, user_id: DbId, date: &str) -> StoreResult<Vec<StudyPlan>>;

    /// A user's check-ins dated `date`.
    async fn logs_for_date(&self, user_id: DbId, date: &str) -> StoreResult<Vec<DailyLog>>;

    /// Whether a notification with `idempotency_key` exists for the user
    /// since `since`.
    async fn notification_exists(
        &self,
        user_id: DbId,
        idempotency_key: &str,
        since: Timestamp,
    ) -> StoreResult<bool>;

    /// Insert unless the idempotency key is taken; `None` means it was.
    async fn insert_notification(&self, input: &NewNotification)
        -> StoreResult<Option<Notification>>;

    /// Undismissed notifications created at or after `since`.
    async fn unread_notifications(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> StoreResult<Vec<Notification>>;

    /// Set `dismissed_at`. Returns `false` if nothing was updated.
    async fn dismiss_notification(
        &self,
        user_id: DbId,
        notification_id: DbId,
        at: Timestamp,
    ) -> StoreResult<bool>;

    async fn last_seen(&self, user_id: DbId) -> StoreResult<Option<Timestamp>>;

    async fn touch_activity(&self, user_id: DbId, at: Timestamp) -> StoreResult<()>;

    async fn insert_cron_log(&self, entry: &NewCronLog) -> StoreResult<()>;

    /// Premium profiles expiring at or before `cutoff`.
    async fn premium_expiring_before(&self, cutoff: Timestamp) -> StoreResult<Vec<UserProfile>>;

    /// Clear the premium flag. Returns `false` if it was already clear.
    async fn revoke_premium(&self, user_id: DbId) -> StoreResult<bool>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// [`ReminderStore`] backed by the repositories.
#[derive(Clone)]
pub struct PgReminderStore {
    pool: DbPool,
}

impl PgReminderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ReminderStore for PgReminderStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(UserRepo::list_all(&self.pool).await?)
    }

    async fn find_user(&self, user_id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, user_id).await?)
    }

    async fn plans_for_date(&self, user_id: DbId, date: &str) -> StoreResult<Vec<StudyPlan>> {
        Ok(StudyPlanRepo::list_for_user_on(&self.pool, user_id, date).await?)
    }

    async fn logs_for_date(&self, user_id: DbId, date: &str) -> StoreResult<Vec<DailyLog>> {
        Ok(DailyLogRepo::list_for_user_on(&self.pool, user_id, date).await?)
    }

    async fn notification_exists(
        &self,
        user_id: DbId,
        idempotency_key: &str,
        since: Timestamp,
    ) -> StoreResult<bool> {
        Ok(NotificationRepo::exists_since(&self.pool, user_id, idempotency_key, since).await?)
    }

    async fn insert_notification(
        &self,
        input: &NewNotification,
    ) -> StoreResult<Option<Notification>> {
        Ok(NotificationRepo::insert_if_absent(&self.pool, input).await?)
    }

    async fn unread_notifications(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> StoreResult<Vec<Notification>> {
        Ok(NotificationRepo::list_unread_since(&self.pool, user_id, since).await?)
    }

    async fn dismiss_notification(
        &self,
        user_id: DbId,
        notification_id: DbId,
        at: Timestamp,
    ) -> StoreResult<bool> {
        Ok(NotificationRepo::dismiss(&self.pool, notification_id, user_id, at).await?)
    }

    async fn last_seen(&self, user_id: DbId) -> StoreResult<Option<Timestamp>> {
        Ok(UserActivityRepo::last_seen(&self.pool, user_id).await?)
    }

    async fn touch_activity(&self, user_id: DbId, at: Timestamp) -> StoreResult<()> {
        Ok(UserActivityRepo::touch(&self.pool, user_id, at).await?)
    }

    async fn insert_cron_log(&self, entry: &NewCronLog) -> StoreResult<()> {
        CronLogRepo::insert(&self.pool, entry).await?;
        Ok(())
    }

    async fn premium_expiring_before(&self, cutoff: Timestamp) -> StoreResult<Vec<UserProfile>> {
        Ok(UserProfileRepo::list_premium_expiring_before(&self.pool, cutoff).await?)
    }

    async fn revoke_premium(&self, user_id: DbId) -> StoreResult<bool> {
        Ok(UserProfileRepo::revoke_premium(&self.pool, user_id).await?)
    }
}
