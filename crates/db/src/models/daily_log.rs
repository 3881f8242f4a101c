//! Daily completion log model.

use satprep_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The plan was studied.
pub const STATUS_DONE: &str = "done";

/// The plan was not studied.
pub const STATUS_MISSED: &str = "missed";

/// A row from the `daily_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyLog {
    pub id: DbId,
    pub user_id: DbId,
    pub plan_id: DbId,
    pub date: String,
    pub status: String,
    pub checked_at: Option<Timestamp>,
}

/// DTO for checking in a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDailyLog {
    pub user_id: DbId,
    pub plan_id: DbId,
    pub date: String,
    pub status: String,
    pub checked_at: Option<Timestamp>,
}
