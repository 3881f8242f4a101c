//! Batch-run audit records.

use satprep_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Job tag for the reminder dispatch run.
pub const JOB_DISPATCH: &str = "dispatch_notifications";

/// Job tag for the premium expiry run.
pub const JOB_PREMIUM_EXPIRY: &str = "premium_expiry";

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// A row from the `cron_logs` table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CronLog {
    pub id: DbId,
    pub job: String,
    pub run_at: Timestamp,
    pub status: String,
    pub users_processed: i32,
    pub notifications_created: i32,
    pub emails_sent: i32,
    pub error_message: Option<String>,
}

/// DTO for recording one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCronLog {
    pub job: &'static str,
    pub run_at: Timestamp,
    pub status: &'static str,
    pub users_processed: i32,
    pub notifications_created: i32,
    pub emails_sent: i32,
    pub error_message: Option<String>,
}

impl NewCronLog {
    /// A successful run with the given aggregate counts.
    pub fn success(
        job: &'static str,
        run_at: Timestamp,
        users_processed: i32,
        notifications_created: i32,
        emails_sent: i32,
    ) -> Self {
        Self {
            job,
            run_at,
            status: STATUS_SUCCESS,
            users_processed,
            notifications_created,
            emails_sent,
            error_message: None,
        }
    }

    /// An aborted run.
    pub fn error(job: &'static str, run_at: Timestamp, message: impl Into<String>) -> Self {
        Self {
            job,
            run_at,
            status: STATUS_ERROR,
            users_processed: 0,
            notifications_created: 0,
            emails_sent: 0,
            error_message: Some(message.into()),
        }
    }
}
