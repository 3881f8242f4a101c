//! Handlers for the scheduler-triggered batch jobs.
//!
//! Both endpoints require the cron secret (when configured), run one job to
//! completion and report its counts.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::dispatch::{DispatchJob, DispatchSummary, JobContext, PremiumExpiryJob, PremiumSummary};
use crate::error::AppResult;
use crate::middleware::cron_auth::CronAuth;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Body of a successful dispatch run.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub processed: usize,
    #[serde(rename = "notificationsCreated")]
    pub notifications_created: usize,
    pub emails_sent: usize,
}

impl From<DispatchSummary> for DispatchResponse {
    fn from(summary: DispatchSummary) -> Self {
        Self {
            success: true,
            processed: summary.users_processed,
            notifications_created: summary.notifications_created,
            emails_sent: summary.emails_sent,
        }
    }
}

/// Body of a successful premium expiry run.
#[derive(Debug, Serialize)]
pub struct PremiumExpiryResponse {
    pub success: bool,
    pub processed: usize,
    pub revoked: usize,
    pub warned: usize,
    pub emails_sent: usize,
}

impl From<PremiumSummary> for PremiumExpiryResponse {
    fn from(summary: PremiumSummary) -> Self {
        Self {
            success: true,
            processed: summary.processed,
            revoked: summary.revoked,
            warned: summary.warned,
            emails_sent: summary.emails_sent,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/dispatch_notifications
pub async fn dispatch_notifications(
    _auth: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DispatchResponse>> {
    let ctx = JobContext::from_state(&state)?;
    let summary = DispatchJob::new(ctx).run().await?;
    Ok(Json(summary.into()))
}

/// POST /api/premium_expiry
pub async fn premium_expiry(
    _auth: CronAuth,
    State(state): State<AppState>,
) -> AppResult<Json<PremiumExpiryResponse>> {
    let ctx = JobContext::from_state(&state)?;
    let summary = PremiumExpiryJob::new(ctx).run().await?;
    Ok(Json(summary.into()))
}
