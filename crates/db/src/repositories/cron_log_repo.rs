//! Repository for the `cron_logs` audit table.

use sqlx::PgPool;

use crate::models::cron_log::{CronLog, NewCronLog};

const COLUMNS: &str = "id, job, run_at, status, users_processed, notifications_created, \
                       emails_sent, error_message";

/// Append-only access to batch run records.
pub struct CronLogRepo;

impl CronLogRepo {
    /// Record one run.
    pub async fn insert(pool: &PgPool, entry: &NewCronLog) -> Result<CronLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO cron_logs \
                (job, run_at, status, users_processed, notifications_created, emails_sent, error_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CronLog>(&query)
            .bind(entry.job)
            .bind(entry.run_at)
            .bind(entry.status)
            .bind(entry.users_processed)
            .bind(entry.notifications_created)
            .bind(entry.emails_sent)
            .bind(&entry.error_message)
            .fetch_one(pool)
            .await
    }

    /// Most recent runs of a job, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        job: &str,
        limit: i64,
    ) -> Result<Vec<CronLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cron_logs WHERE job = $1 ORDER BY run_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, CronLog>(&query)
            .bind(job)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
