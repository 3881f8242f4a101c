//! In-process trigger for the reminder dispatch run.
//!
//! Enabled by `DISPATCH_INTERVAL_SECS`. Runs the same [`DispatchJob`] the
//! HTTP endpoint runs, on a fixed `tokio::time::interval`. Deployments that
//! trigger the endpoint from an external cron leave it off.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatchJob, JobContext};

/// Run the dispatch loop until `cancel` is triggered.
///
/// The first run happens immediately. A tick that arrives while a run is
/// still in progress is skipped rather than queued.
pub async fn run(ctx: JobContext, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Dispatch scheduler started");

    let job = DispatchJob::new(ctx);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Dispatch scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                match job.run().await {
                    Ok(summary) => tracing::debug!(
                        users_processed = summary.users_processed,
                        notifications_created = summary.notifications_created,
                        emails_sent = summary.emails_sent,
                        "Scheduled dispatch finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled dispatch failed"),
                }
            }
        }
    }
}
