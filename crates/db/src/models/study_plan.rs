//! Study plan entity model and DTOs.

use satprep_core::reminder::PlanSlot;
use satprep_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `study_plan` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyPlan {
    pub id: DbId,
    pub user_id: DbId,
    /// Local calendar day, `YYYY-MM-DD`.
    pub date: String,
    /// Subject tag, e.g. `"math"`.
    pub section: String,
    /// Local wall-clock `HH:MM`.
    pub start_time: String,
    pub end_time: String,
    pub tasks_text: String,
    pub created_at: Timestamp,
}

impl StudyPlan {
    /// The fields the reminder detector evaluates.
    pub fn slot(&self) -> PlanSlot {
        PlanSlot {
            id: self.id,
            date: self.date.clone(),
            section: self.section.clone(),
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
        }
    }
}

/// DTO for creating a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudyPlan {
    pub user_id: DbId,
    pub date: String,
    pub section: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub tasks_text: String,
}

/// DTO for editing a plan. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudyPlan {
    pub section: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub tasks_text: Option<String>,
}
