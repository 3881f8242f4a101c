//! The per-user realtime mirror.
//!
//! While the app is open, a [`ReminderMirror`] re-runs reminder detection
//! for the signed-in user and presents unread notifications as toasts. A
//! cycle is triggered by a periodic poll and by every change-feed insert
//! for the user. Detection writes through the same [`NotificationLedger`]
//! as the server dispatch run, so whichever producer gets there first owns
//! the row and the other one skips it.
//!
//! The mirror owns its shown-id set; toasts live in a shared [`ToastTray`]
//! the UI reads from. [`ReminderMirror::spawn`] moves the mirror onto a
//! task and returns a [`MirrorHandle`] that stops it on shutdown or drop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use satprep_core::clock::Clock;
use satprep_core::reminder::{detect, Phrasing};
use satprep_core::timeutil::{local_date, tomorrow, utc_day_start};
use satprep_core::types::DbId;
use satprep_db::models::study_plan::StudyPlan;
use satprep_db::{LedgerOutcome, NotificationLedger, ReminderStore, StoreError};
use satprep_events::{ChangeEvent, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::toast::ToastTray;

/// Default period of the fallback poll.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

const TOAST_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Notifications this cycle inserted through the ledger.
    pub created: usize,
    /// Notifications newly put on screen.
    pub presented: usize,
    /// Stale plan-start notifications held back.
    pub suppressed: usize,
}

pub struct ReminderMirror {
    user_id: DbId,
    store: Arc<dyn ReminderStore>,
    clock: Arc<dyn Clock>,
    shown: HashSet<DbId>,
    tray: Arc<Mutex<ToastTray>>,
}

impl ReminderMirror {
    pub fn new(user_id: DbId, store: Arc<dyn ReminderStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_id,
            store,
            clock,
            shown: HashSet::new(),
            tray: Arc::new(Mutex::new(ToastTray::new())),
        }
    }

    pub fn tray(&self) -> Arc<Mutex<ToastTray>> {
        Arc::clone(&self.tray)
    }

    /// Detect, then present.
    ///
    /// A detection failure is logged and the cycle still presents whatever
    /// is already unread. Only a failure to read unread notifications is
    /// returned.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, StoreError> {
        let mut report = CycleReport::default();

        match self.detect_and_record().await {
            Ok(created) => report.created = created,
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "Mirror detection failed");
            }
        }

        let now = self.clock.now();
        let local_now = self.clock.local_now();
        let today = local_date(local_now);

        let unread = self
            .store
            .unread_notifications(self.user_id, utc_day_start(now))
            .await?;

        let mut tray = self.tray.lock().await;
        // Oldest first, so the newest toast ends up on top.
        for notification in unread.iter().rev() {
            if self.shown.contains(&notification.id) {
                continue;
            }
            self.shown.insert(notification.id);

            let stale = notification
                .resolved_payload()
                .is_some_and(|p| p.is_stale(&today, local_now));
            if stale {
                report.suppressed += 1;
                continue;
            }

            if tray.push(notification, now) {
                report.presented += 1;
            }
        }

        Ok(report)
    }

    async fn detect_and_record(&self) -> Result<usize, StoreError> {
        let store = self.store.as_ref();
        let local_now = self.clock.local_now();
        let today = local_date(local_now);

        let today_slots: Vec<_> = store
            .plans_for_date(self.user_id, &today)
            .await?
            .iter()
            .map(StudyPlan::slot)
            .collect();
        let tomorrow_slots: Vec<_> = store
            .plans_for_date(self.user_id, &tomorrow(local_now))
            .await?
            .iter()
            .map(StudyPlan::slot)
            .collect();
        let logged: HashSet<DbId> = store
            .logs_for_date(self.user_id, &today)
            .await?
            .into_iter()
            .map(|log| log.plan_id)
            .collect();

        let ledger = NotificationLedger::new(store);
        let mut created = 0;
        for candidate in detect(&today_slots, &tomorrow_slots, &logged, local_now, Phrasing::Mirror) {
            if let LedgerOutcome::Created(n) =
                ledger.record(self.user_id, &candidate, self.clock.now()).await?
            {
                tracing::debug!(
                    user_id = %self.user_id,
                    kind = candidate.payload.kind(),
                    notification_id = %n.id,
                    "Mirror created notification"
                );
                created += 1;
            }
        }
        Ok(created)
    }

    /// Move the mirror onto a background task.
    ///
    /// Records the app launch in `user_activity`, then runs a cycle
    /// immediately, every `poll_interval`, and on each change-feed insert
    /// for this user. Expired toasts are swept every second.
    pub fn spawn(self, bus: &EventBus, poll_interval: Duration) -> MirrorHandle {
        let cancel = CancellationToken::new();
        let tray = self.tray();
        let feed = bus.subscribe();
        let task = tokio::spawn(self.run(feed, poll_interval, cancel.clone()));

        MirrorHandle {
            cancel,
            task: Some(task),
            tray,
        }
    }

    async fn run(
        mut self,
        feed: broadcast::Receiver<ChangeEvent>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) {
        tracing::info!(user_id = %self.user_id, "Reminder mirror started");

        if let Err(e) = self.store.touch_activity(self.user_id, self.clock.now()).await {
            tracing::warn!(user_id = %self.user_id, error = %e, "Failed to record app launch");
        }

        let mut feed = Some(feed);
        let mut poll = tokio::time::interval(poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sweep = tokio::time::interval(TOAST_SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = poll.tick() => self.cycle("poll").await,
                event = next_event(&mut feed) => match event {
                    Ok(event) if event.user_id() == self.user_id => self.cycle("change_feed").await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Change feed lagged, resyncing");
                        self.cycle("change_feed_lagged").await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::warn!(user_id = %self.user_id, "Change feed closed, polling only");
                        feed = None;
                    }
                },
                _ = sweep.tick() => {
                    let now = self.clock.now();
                    self.tray.lock().await.expire(now);
                }
            }
        }

        tracing::info!(user_id = %self.user_id, "Reminder mirror stopped");
    }

    async fn cycle(&mut self, trigger: &'static str) {
        match self.run_cycle().await {
            Ok(report) => tracing::debug!(
                user_id = %self.user_id,
                trigger,
                created = report.created,
                presented = report.presented,
                suppressed = report.suppressed,
                "Mirror cycle complete"
            ),
            Err(e) => tracing::warn!(user_id = %self.user_id, trigger, error = %e, "Mirror cycle failed"),
        }
    }
}

async fn next_event(
    feed: &mut Option<broadcast::Receiver<ChangeEvent>>,
) -> Result<ChangeEvent, RecvError> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Owner of a running mirror task.
///
/// Dropping the handle cancels and aborts the task; [`MirrorHandle::shutdown`]
/// additionally waits for it to finish.
pub struct MirrorHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    tray: Arc<Mutex<ToastTray>>,
}

impl MirrorHandle {
    pub fn tray(&self) -> Arc<Mutex<ToastTray>> {
        Arc::clone(&self.tray)
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Reminder mirror task failed");
            }
        }
    }
}

impl Drop for MirrorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
