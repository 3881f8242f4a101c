//! Repository for the `daily_log` table.

use satprep_core::types::DbId;
use sqlx::PgPool;

use crate::models::daily_log::{CreateDailyLog, DailyLog};

const COLUMNS: &str = "id, user_id, plan_id, date, status, checked_at";

/// Provides access to plan check-ins.
pub struct DailyLogRepo;

impl DailyLogRepo {
    /// A user's logs for one local day.
    pub async fn list_for_user_on(
        pool: &PgPool,
        user_id: DbId,
        date: &str,
    ) -> Result<Vec<DailyLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM daily_log WHERE user_id = $1 AND date = $2 ORDER BY id"
        );
        sqlx::query_as::<_, DailyLog>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// The log attached to a plan, if any.
    pub async fn find_for_plan(
        pool: &PgPool,
        plan_id: DbId,
    ) -> Result<Option<DailyLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM daily_log WHERE plan_id = $1 LIMIT 1");
        sqlx::query_as::<_, DailyLog>(&query)
            .bind(plan_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a check-in unless the plan already has one.
    ///
    /// There is no unique constraint on `plan_id`; this check-before-insert
    /// is what keeps it to one log per plan. Returns the log and whether it
    /// was created by this call.
    pub async fn check_in(
        pool: &PgPool,
        input: &CreateDailyLog,
    ) -> Result<(DailyLog, bool), sqlx::Error> {
        if let Some(existing) = Self::find_for_plan(pool, input.plan_id).await? {
            return Ok((existing, false));
        }

        let query = format!(
            "INSERT INTO daily_log (user_id, plan_id, date, status, checked_at) \
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW())) \
             RETURNING {COLUMNS}"
        );
        let log = sqlx::query_as::<_, DailyLog>(&query)
            .bind(input.user_id)
            .bind(input.plan_id)
            .bind(&input.date)
            .bind(&input.status)
            .bind(input.checked_at)
            .fetch_one(pool)
            .await?;
        Ok((log, true))
    }
}
