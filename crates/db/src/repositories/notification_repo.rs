//! Repository for the `notifications` table.

use satprep_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::notification::{NewNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, message, payload, idempotency_key, created_at, dismissed_at";

/// Maximum rows returned by unread listings.
const UNREAD_LIMIT: i64 = 50;

/// Provides ledger and inbox operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Whether a notification with this key exists for the user since `since`.
    pub async fn exists_since(
        pool: &PgPool,
        user_id: DbId,
        idempotency_key: &str,
        since: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM notifications \
                WHERE user_id = $1 AND idempotency_key = $2 AND created_at >= $3 \
             )",
        )
        .bind(user_id)
        .bind(idempotency_key)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Insert unless a row with the same idempotency key already exists.
    ///
    /// Returns `None` when the unique key rejected the insert, which is how a
    /// concurrent producer that lost the race finds out.
    pub async fn insert_if_absent(
        pool: &PgPool,
        input: &NewNotification,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (user_id, message, payload, idempotency_key, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (idempotency_key) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.user_id)
            .bind(&input.message)
            .bind(input.payload_json())
            .bind(&input.idempotency_key)
            .bind(input.created_at)
            .fetch_optional(pool)
            .await
    }

    /// Undismissed notifications created at or after `since`, newest first.
    pub async fn list_unread_since(
        pool: &PgPool,
        user_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 AND dismissed_at IS NULL AND created_at >= $2 \
             ORDER BY created_at DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(since)
            .bind(UNREAD_LIMIT)
            .fetch_all(pool)
            .await
    }

    /// Mark a notification dismissed.
    ///
    /// Returns `true` if an undismissed notification owned by the user was
    /// updated.
    pub async fn dismiss(
        pool: &PgPool,
        notification_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET dismissed_at = $3 \
             WHERE id = $1 AND user_id = $2 AND dismissed_at IS NULL",
        )
        .bind(notification_id)
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
