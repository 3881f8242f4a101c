//! The reminder dispatch run.
//!
//! For every user in the directory:
//!
//! 1. load today's plans and logs and detect plan-start / missed-check-in
//!    events;
//! 2. offer each event to the ledger, which inserts it unless it was
//!    already recorded today;
//! 3. queue an email for each new notification if the user has not opened
//!    the app since it was created;
//! 4. load tomorrow's plans and, if there are none, do the same for the
//!    no-plan-tomorrow reminder.
//!
//! Steps 1-3 and step 4 fail independently. A failure for one user is
//! logged and the run moves on. Queued emails go
//! out concurrently after the scan, and the run ends with one `cron_logs`
//! row. An error that escapes the per-user loop (listing users, writing the
//! audit row) aborts the run; a best-effort error row is written and the
//! error is returned to the caller.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use satprep_core::reminder::{detect_plan_events, detect_tomorrow_gap, Phrasing, ReminderCandidate};
use satprep_core::timeutil::{local_date, tomorrow};
use satprep_core::types::{DbId, Timestamp};
use satprep_db::models::cron_log::{NewCronLog, JOB_DISPATCH};
use satprep_db::models::study_plan::StudyPlan;
use satprep_db::models::user::User;
use satprep_db::StoreError;
use satprep_events::render_reminder_email;

use super::outbox::{EmailGate, Outbox};
use super::{audit_count, JobContext};

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub users_processed: usize,
    pub notifications_created: usize,
    pub emails_sent: usize,
}

/// One reminder dispatch run over all users.
pub struct DispatchJob {
    ctx: JobContext,
}

impl DispatchJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    /// Execute the run and record it in `cron_logs`.
    pub async fn run(&self) -> Result<DispatchSummary, StoreError> {
        let run_at = self.ctx.clock.now();
        let result = self.process(run_at).await;
        if let Err(e) = &result {
            self.ctx.record_failure(JOB_DISPATCH, run_at, e).await;
        }
        result
    }

    async fn process(&self, run_at: Timestamp) -> Result<DispatchSummary, StoreError> {
        let users = self.ctx.store.list_users().await?;
        tracing::info!(users = users.len(), "Dispatch run started");

        let mut summary = DispatchSummary::default();
        let mut outbox = Outbox::default();

        for user in &users {
            summary.users_processed += 1;
            self.process_user(user, &mut summary, &mut outbox).await;
        }

        let queued = outbox.len();
        summary.emails_sent = outbox
            .flush(self.ctx.email.as_deref(), self.ctx.email_concurrency)
            .await;

        self.ctx
            .store
            .insert_cron_log(&NewCronLog::success(
                JOB_DISPATCH,
                run_at,
                audit_count(summary.users_processed),
                audit_count(summary.notifications_created),
                audit_count(summary.emails_sent),
            ))
            .await?;

        tracing::info!(
            users_processed = summary.users_processed,
            notifications_created = summary.notifications_created,
            emails_queued = queued,
            emails_sent = summary.emails_sent,
            "Dispatch run complete"
        );
        Ok(summary)
    }

    /// Today's plan events and the tomorrow gap check run as separate steps.
    /// A store failure in one is logged and does not skip the other.
    async fn process_user(&self, user: &User, summary: &mut DispatchSummary, outbox: &mut Outbox) {
        let store = self.ctx.store.as_ref();
        let local_now = self.ctx.clock.local_now();
        let mut gate = EmailGate::new(store, user.id, user.email.as_deref());

        if let Err(e) = self
            .plan_events(user.id, local_now, &mut gate, summary, outbox)
            .await
        {
            tracing::error!(user_id = %user.id, error = %e, "Plan reminders failed for user, continuing");
        }

        if let Err(e) = self
            .tomorrow_gap(user.id, local_now, &mut gate, summary, outbox)
            .await
        {
            tracing::error!(user_id = %user.id, error = %e, "Tomorrow check failed for user, continuing");
        }
    }

    async fn plan_events(
        &self,
        user_id: DbId,
        local_now: NaiveDateTime,
        gate: &mut EmailGate<'_>,
        summary: &mut DispatchSummary,
        outbox: &mut Outbox,
    ) -> Result<(), StoreError> {
        let store = self.ctx.store.as_ref();
        let today = local_date(local_now);

        let plans = store.plans_for_date(user_id, &today).await?;
        let logged: HashSet<DbId> = store
            .logs_for_date(user_id, &today)
            .await?
            .into_iter()
            .map(|log| log.plan_id)
            .collect();
        let slots: Vec<_> = plans.iter().map(StudyPlan::slot).collect();

        for candidate in detect_plan_events(&slots, &logged, local_now, Phrasing::Dispatch) {
            self.deliver(user_id, &candidate, gate, summary, outbox)
                .await?;
        }
        Ok(())
    }

    async fn tomorrow_gap(
        &self,
        user_id: DbId,
        local_now: NaiveDateTime,
        gate: &mut EmailGate<'_>,
        summary: &mut DispatchSummary,
        outbox: &mut Outbox,
    ) -> Result<(), StoreError> {
        let tomorrow_slots: Vec<_> = self
            .ctx
            .store
            .plans_for_date(user_id, &tomorrow(local_now))
            .await?
            .iter()
            .map(StudyPlan::slot)
            .collect();

        if let Some(candidate) = detect_tomorrow_gap(&tomorrow_slots, local_now) {
            self.deliver(user_id, &candidate, gate, summary, outbox)
                .await?;
        }
        Ok(())
    }

    async fn deliver(
        &self,
        user_id: DbId,
        candidate: &ReminderCandidate,
        gate: &mut EmailGate<'_>,
        summary: &mut DispatchSummary,
        outbox: &mut Outbox,
    ) -> Result<(), StoreError> {
        let Some(notification) = self.ctx.persist(user_id, candidate).await? else {
            return Ok(());
        };
        summary.notifications_created += 1;

        if let Some(to) = gate.recipient(notification.created_at).await {
            let email =
                render_reminder_email(&candidate.payload, &notification.message, &self.ctx.app_url);
            outbox.push(user_id, to, email);
        }
        Ok(())
    }
}
