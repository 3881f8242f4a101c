//! App-foreground heartbeat.

use satprep_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_activity` table, upserted once per app launch.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserActivity {
    pub user_id: DbId,
    pub last_seen_at: Timestamp,
}
