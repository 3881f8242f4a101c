//! Repository for the `user_profiles` table.

use satprep_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user_profile::UserProfile;

const COLUMNS: &str = "user_id, display_name, is_premium, premium_expires_at, updated_at";

/// Profile and premium-flag access.
pub struct UserProfileRepo;

impl UserProfileRepo {
    /// Premium profiles whose expiry falls at or before `cutoff`.
    pub async fn list_premium_expiring_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<UserProfile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_profiles \
             WHERE is_premium AND premium_expires_at IS NOT NULL AND premium_expires_at <= $1 \
             ORDER BY premium_expires_at"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    /// Clear the premium flag. Returns `true` if it was set.
    pub async fn revoke_premium(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_profiles SET is_premium = false, updated_at = NOW() \
             WHERE user_id = $1 AND is_premium",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Create or replace a profile's premium state.
    pub async fn upsert_premium(
        pool: &PgPool,
        user_id: DbId,
        is_premium: bool,
        premium_expires_at: Option<Timestamp>,
    ) -> Result<UserProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_profiles (user_id, is_premium, premium_expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET \
                is_premium = EXCLUDED.is_premium, \
                premium_expires_at = EXCLUDED.premium_expires_at, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .bind(is_premium)
            .bind(premium_expires_at)
            .fetch_one(pool)
            .await
    }
}
