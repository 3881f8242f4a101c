//! The premium expiry run.
//!
//! Profiles whose `premium_expires_at` has passed lose the premium flag and
//! get an expired notification; profiles expiring within the warning window
//! get a one-time warning. Notifications go through the same ledger and
//! email rules as the reminder dispatch.

use chrono::Duration;
use serde::Serialize;

use satprep_core::premium::{PremiumStatus, EXPIRY_WARNING_WINDOW_HOURS};
use satprep_core::reminder::{
    NotificationPayload, ReminderCandidate, PREMIUM_EXPIRED_MESSAGE, PREMIUM_EXPIRING_MESSAGE,
};
use satprep_core::timeutil::{local_date, DATE_FORMAT};
use satprep_core::types::Timestamp;
use satprep_db::models::cron_log::{NewCronLog, JOB_PREMIUM_EXPIRY};
use satprep_db::models::user_profile::UserProfile;
use satprep_db::StoreError;
use satprep_events::render_reminder_email;

use super::outbox::{EmailGate, Outbox};
use super::{audit_count, JobContext};

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PremiumSummary {
    pub processed: usize,
    pub revoked: usize,
    pub warned: usize,
    pub notifications_created: usize,
    pub emails_sent: usize,
}

pub struct PremiumExpiryJob {
    ctx: JobContext,
}

impl PremiumExpiryJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    /// Execute the run and record it in `cron_logs`.
    pub async fn run(&self) -> Result<PremiumSummary, StoreError> {
        let run_at = self.ctx.clock.now();
        let result = self.process(run_at).await;
        if let Err(e) = &result {
            self.ctx.record_failure(JOB_PREMIUM_EXPIRY, run_at, e).await;
        }
        result
    }

    async fn process(&self, now: Timestamp) -> Result<PremiumSummary, StoreError> {
        let cutoff = now + Duration::hours(EXPIRY_WARNING_WINDOW_HOURS);
        let profiles = self.ctx.store.premium_expiring_before(cutoff).await?;
        tracing::info!(profiles = profiles.len(), "Premium expiry run started");

        let mut summary = PremiumSummary::default();
        let mut outbox = Outbox::default();

        for profile in &profiles {
            summary.processed += 1;
            if let Err(e) = self
                .process_profile(profile, now, &mut summary, &mut outbox)
                .await
            {
                tracing::error!(user_id = %profile.user_id, error = %e, "Premium expiry failed for user, continuing");
            }
        }

        summary.emails_sent = outbox
            .flush(self.ctx.email.as_deref(), self.ctx.email_concurrency)
            .await;

        self.ctx
            .store
            .insert_cron_log(&NewCronLog::success(
                JOB_PREMIUM_EXPIRY,
                now,
                audit_count(summary.processed),
                audit_count(summary.notifications_created),
                audit_count(summary.emails_sent),
            ))
            .await?;

        tracing::info!(
            processed = summary.processed,
            revoked = summary.revoked,
            warned = summary.warned,
            emails_sent = summary.emails_sent,
            "Premium expiry run complete"
        );
        Ok(summary)
    }

    async fn process_profile(
        &self,
        profile: &UserProfile,
        now: Timestamp,
        summary: &mut PremiumSummary,
        outbox: &mut Outbox,
    ) -> Result<(), StoreError> {
        let store = self.ctx.store.as_ref();

        let candidate = match profile.premium_status(now) {
            PremiumStatus::Expired => {
                if !store.revoke_premium(profile.user_id).await? {
                    return Ok(());
                }
                summary.revoked += 1;
                tracing::info!(user_id = %profile.user_id, "Premium revoked");
                ReminderCandidate::new(
                    PREMIUM_EXPIRED_MESSAGE,
                    NotificationPayload::PremiumExpired,
                    local_date(self.ctx.clock.local_now()),
                )
            }
            PremiumStatus::ExpiringSoon => {
                let Some(expires_at) = profile.premium_expires_at else {
                    return Ok(());
                };
                // Keyed on the expiry's own day so each expiry is warned once.
                ReminderCandidate::new(
                    PREMIUM_EXPIRING_MESSAGE,
                    NotificationPayload::PremiumExpiring { expires_at },
                    expires_at.format(DATE_FORMAT).to_string(),
                )
            }
            PremiumStatus::Free | PremiumStatus::Active => return Ok(()),
        };

        let Some(notification) = self.ctx.persist(profile.user_id, &candidate).await? else {
            return Ok(());
        };
        summary.notifications_created += 1;
        if matches!(candidate.payload, NotificationPayload::PremiumExpiring { .. }) {
            summary.warned += 1;
        }

        let user = store.find_user(profile.user_id).await?;
        let address = user.as_ref().and_then(|u| u.email.as_deref());
        let mut gate = EmailGate::new(store, profile.user_id, address);
        if let Some(to) = gate.recipient(notification.created_at).await {
            let email =
                render_reminder_email(&candidate.payload, &notification.message, &self.ctx.app_url);
            outbox.push(profile.user_id, to, email);
        }
        Ok(())
    }
}
