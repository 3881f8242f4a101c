//! Repository for the `study_plan` table.

use satprep_core::types::DbId;
use sqlx::PgPool;

use crate::models::study_plan::{CreateStudyPlan, StudyPlan, UpdateStudyPlan};

/// Column list for `study_plan` queries.
const COLUMNS: &str = "id, user_id, date, section, start_time, end_time, tasks_text, created_at";

/// Provides CRUD operations for study plans.
pub struct StudyPlanRepo;

impl StudyPlanRepo {
    /// Insert a new plan, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateStudyPlan) -> Result<StudyPlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO study_plan (user_id, date, section, start_time, end_time, tasks_text) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(input.user_id)
            .bind(&input.date)
            .bind(&input.section)
            .bind(&input.start_time)
            .bind(&input.end_time)
            .bind(&input.tasks_text)
            .fetch_one(pool)
            .await
    }

    /// Find a plan by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StudyPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM study_plan WHERE id = $1");
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A user's plans on one local day, ordered by start time.
    pub async fn list_for_user_on(
        pool: &PgPool,
        user_id: DbId,
        date: &str,
    ) -> Result<Vec<StudyPlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM study_plan \
             WHERE user_id = $1 AND date = $2 \
             ORDER BY start_time, id"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial edit. Returns `None` if the plan does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStudyPlan,
    ) -> Result<Option<StudyPlan>, sqlx::Error> {
        let query = format!(
            "UPDATE study_plan SET \
                section = COALESCE($2, section), \
                start_time = COALESCE($3, start_time), \
                end_time = COALESCE($4, end_time), \
                tasks_text = COALESCE($5, tasks_text) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(id)
            .bind(&input.section)
            .bind(&input.start_time)
            .bind(&input.end_time)
            .bind(&input.tasks_text)
            .fetch_optional(pool)
            .await
    }

    /// Delete a plan together with its logs.
    ///
    /// `daily_log.plan_id` has no cascade, so the logs go first inside one
    /// transaction. Returns `true` if the plan existed.
    pub async fn delete_with_logs(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM daily_log WHERE plan_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM study_plan WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
