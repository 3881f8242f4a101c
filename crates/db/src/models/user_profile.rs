//! User profile and premium flag.

use satprep_core::premium::{self, PremiumStatus};
use satprep_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub user_id: DbId,
    pub display_name: Option<String>,
    pub is_premium: bool,
    pub premium_expires_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl UserProfile {
    pub fn premium_status(&self, now: Timestamp) -> PremiumStatus {
        premium::classify(self.is_premium, self.premium_expires_at, now)
    }
}
