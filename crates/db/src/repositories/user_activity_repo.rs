//! Repository for the `user_activity` table.

use satprep_core::types::{DbId, Timestamp};
use sqlx::PgPool;

/// Tracks when each user last had the app in the foreground.
pub struct UserActivityRepo;

impl UserActivityRepo {
    /// Upsert the user's last-seen timestamp.
    pub async fn touch(pool: &PgPool, user_id: DbId, at: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_activity (user_id, last_seen_at) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET last_seen_at = EXCLUDED.last_seen_at",
        )
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// The user's last-seen timestamp, if they ever opened the app.
    pub async fn last_seen(pool: &PgPool, user_id: DbId) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar("SELECT last_seen_at FROM user_activity WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
