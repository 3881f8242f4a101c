//! Batch jobs triggered by the external scheduler (or the in-process one).
//!
//! - [`orchestrator::DispatchJob`]: scans every user's plans and persists
//!   due reminders through the ledger, emailing users who are away.
//! - [`premium::PremiumExpiryJob`]: revokes lapsed premium flags and warns
//!   profiles about to lapse.
//!
//! Both jobs share a [`JobContext`], isolate failures per user and append
//! one `cron_logs` row per run.

pub mod orchestrator;
pub mod outbox;
pub mod premium;

use std::sync::Arc;

use satprep_core::clock::Clock;
use satprep_core::reminder::ReminderCandidate;
use satprep_core::types::{DbId, Timestamp};
use satprep_db::models::cron_log::NewCronLog;
use satprep_db::models::notification::Notification;
use satprep_db::{LedgerOutcome, NotificationLedger, ReminderStore, StoreError};
use satprep_events::{ChangeEvent, EmailSender, EventBus};

use crate::error::AppResult;
use crate::state::AppState;

pub use orchestrator::{DispatchJob, DispatchSummary};
pub use premium::{PremiumExpiryJob, PremiumSummary};

/// Collaborators shared by the batch jobs.
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn ReminderStore>,
    pub clock: Arc<dyn Clock>,
    pub email: Option<Arc<dyn EmailSender>>,
    pub event_bus: Arc<EventBus>,
    pub app_url: String,
    pub email_concurrency: usize,
}

impl JobContext {
    /// Assemble from application state. Fails when no store is configured.
    pub fn from_state(state: &AppState) -> AppResult<Self> {
        Ok(Self {
            store: state.store()?,
            clock: Arc::clone(&state.clock),
            email: state.email.clone(),
            event_bus: Arc::clone(&state.event_bus),
            app_url: state.config.app_url.clone(),
            email_concurrency: state.config.email_concurrency,
        })
    }

    /// Offer a candidate to the ledger and announce it on the change feed
    /// if it was persisted.
    ///
    /// Returns `None` when the event was already recorded or its ledger
    /// check failed.
    pub(crate) async fn persist(
        &self,
        user_id: DbId,
        candidate: &ReminderCandidate,
    ) -> Result<Option<Notification>, StoreError> {
        let ledger = NotificationLedger::new(self.store.as_ref());
        match ledger.record(user_id, candidate, self.clock.now()).await? {
            LedgerOutcome::Created(notification) => {
                tracing::debug!(
                    %user_id,
                    kind = candidate.payload.kind(),
                    notification_id = %notification.id,
                    "Notification created"
                );
                self.event_bus.publish(ChangeEvent::NotificationInserted {
                    user_id,
                    notification_id: notification.id,
                    created_at: notification.created_at,
                });
                Ok(Some(notification))
            }
            LedgerOutcome::AlreadyNotified | LedgerOutcome::CheckFailed(_) => Ok(None),
        }
    }

    /// Best-effort error row for an aborted run.
    pub(crate) async fn record_failure(
        &self,
        job: &'static str,
        run_at: Timestamp,
        error: &StoreError,
    ) {
        tracing::error!(job, error = %error, "Batch run aborted");
        let entry = NewCronLog::error(job, run_at, error.to_string());
        if let Err(e) = self.store.insert_cron_log(&entry).await {
            tracing::error!(job, error = %e, "Failed to record aborted run");
        }
    }
}

/// Clamp a count into the `INTEGER` audit columns.
pub(crate) fn audit_count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
