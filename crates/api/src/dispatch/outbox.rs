//! Deferred email fan-out.
//!
//! Jobs decide per notification whether the user should be emailed and
//! queue the rendered message; [`Outbox::flush`] then sends everything with
//! bounded concurrency. A failed send is logged and only lowers the count.

use futures::stream::{self, StreamExt};
use satprep_core::types::{DbId, Timestamp};
use satprep_db::ReminderStore;
use satprep_events::{EmailSender, RenderedEmail};

/// Email a user about a notification iff they have not been seen since it
/// was created. Users with no activity row have never opened the app.
pub fn should_email(last_seen: Option<Timestamp>, created_at: Timestamp) -> bool {
    last_seen.map_or(true, |seen| seen < created_at)
}

/// Per-user email decision with the activity lookup done at most once.
pub(crate) struct EmailGate<'a> {
    store: &'a dyn ReminderStore,
    user_id: DbId,
    address: Option<&'a str>,
    last_seen: Option<Option<Timestamp>>,
}

impl<'a> EmailGate<'a> {
    pub(crate) fn new(store: &'a dyn ReminderStore, user_id: DbId, address: Option<&'a str>) -> Self {
        Self {
            store,
            user_id,
            address,
            last_seen: None,
        }
    }

    /// The address to email about a notification created at `created_at`,
    /// or `None` to skip email.
    pub(crate) async fn recipient(&mut self, created_at: Timestamp) -> Option<&'a str> {
        let address = self.address.filter(|a| !a.trim().is_empty())?;

        let last_seen = match self.last_seen {
            Some(cached) => cached,
            None => match self.store.last_seen(self.user_id).await {
                Ok(seen) => {
                    self.last_seen = Some(seen);
                    seen
                }
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, error = %e, "Activity lookup failed, skipping email");
                    return None;
                }
            },
        };

        should_email(last_seen, created_at).then_some(address)
    }
}

/// One queued email.
#[derive(Debug, Clone)]
pub struct PendingEmail {
    pub user_id: DbId,
    pub to: String,
    pub email: RenderedEmail,
}

/// Emails queued during a run.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<PendingEmail>,
}

impl Outbox {
    pub fn push(&mut self, user_id: DbId, to: &str, email: RenderedEmail) {
        self.pending.push(PendingEmail {
            user_id,
            to: to.to_string(),
            email,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Send every queued email, at most `concurrency` at a time. Returns the
    /// number sent successfully.
    pub async fn flush(self, sender: Option<&dyn EmailSender>, concurrency: usize) -> usize {
        let Some(sender) = sender else {
            if !self.pending.is_empty() {
                tracing::debug!(queued = self.pending.len(), "Email not configured, dropping queue");
            }
            return 0;
        };

        stream::iter(self.pending)
            .map(|item| async move {
                match sender
                    .send(&item.to, &item.email.subject, &item.email.html)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(user_id = %item.user_id, error = %e, "Reminder email failed");
                        false
                    }
                }
            })
            .buffer_unordered(concurrency.max(1))
            .filter(|sent| std::future::ready(*sent))
            .count()
            .await
    }
}
