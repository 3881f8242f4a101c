//! Idempotency ledger over the notifications table.
//!
//! Every producer inserts reminders through [`NotificationLedger::record`]:
//! an existence check for the event's key within the current UTC day,
//! then an insert that the unique key makes safe against concurrent
//! producers passing the same check.

use satprep_core::reminder::ReminderCandidate;
use satprep_core::timeutil::utc_day_start;
use satprep_core::types::{DbId, Timestamp};

use crate::models::notification::{NewNotification, Notification};
use crate::store::{ReminderStore, StoreError};

/// Result of offering a candidate to the ledger.
#[derive(Debug)]
pub enum LedgerOutcome {
    /// A new row was persisted.
    Created(Notification),
    /// An equivalent notification already exists today.
    AlreadyNotified,
    /// The existence check failed; the event is skipped rather than risk a
    /// duplicate.
    CheckFailed(StoreError),
}

/// The de-duplication guard shared by every producer.
pub struct NotificationLedger<'a> {
    store: &'a dyn ReminderStore,
}

impl<'a> NotificationLedger<'a> {
    pub fn new(store: &'a dyn ReminderStore) -> Self {
        Self { store }
    }

    /// Whether `idempotency_key` was already recorded for the user since
    /// `since` (normally UTC midnight of today).
    pub async fn already_notified(
        &self,
        user_id: DbId,
        idempotency_key: &str,
        since: Timestamp,
    ) -> Result<bool, StoreError> {
        self.store
            .notification_exists(user_id, idempotency_key, since)
            .await
    }

    /// Persist `candidate` for `user_id` unless it was already recorded today.
    ///
    /// Insert failures are returned as errors; a failed existence check is
    /// reported as [`LedgerOutcome::CheckFailed`].
    pub async fn record(
        &self,
        user_id: DbId,
        candidate: &ReminderCandidate,
        now: Timestamp,
    ) -> Result<LedgerOutcome, StoreError> {
        let key = candidate.idempotency_key(user_id);

        match self.already_notified(user_id, &key, utc_day_start(now)).await {
            Ok(true) => return Ok(LedgerOutcome::AlreadyNotified),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    %user_id,
                    kind = candidate.payload.kind(),
                    error = %e,
                    "Ledger check failed, skipping event"
                );
                return Ok(LedgerOutcome::CheckFailed(e));
            }
        }

        let input = NewNotification {
            user_id,
            message: candidate.message.clone(),
            payload: candidate.payload.clone(),
            idempotency_key: key,
            created_at: now,
        };

        match self.store.insert_notification(&input).await? {
            Some(notification) => Ok(LedgerOutcome::Created(notification)),
            None => {
                tracing::debug!(%user_id, kind = candidate.payload.kind(), "Lost insert race, already notified");
                Ok(LedgerOutcome::AlreadyNotified)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use satprep_core::reminder::{NotificationPayload, TOMORROW_REMINDER_MESSAGE};
    use uuid::Uuid;

    use crate::memory::InMemoryStore;

    fn candidate() -> ReminderCandidate {
        ReminderCandidate::new(
            TOMORROW_REMINDER_MESSAGE,
            NotificationPayload::TomorrowReminder,
            "2026-03-14",
        )
    }

    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn first_record_creates_second_is_skipped() {
        let store = InMemoryStore::new();
        let ledger = NotificationLedger::new(&store);
        let user = Uuid::from_u128(1);

        let first = ledger.record(user, &candidate(), noon()).await.unwrap();
        assert_matches!(first, LedgerOutcome::Created(n) if n.message == TOMORROW_REMINDER_MESSAGE);

        let second = ledger.record(user, &candidate(), noon()).await.unwrap();
        assert_matches!(second, LedgerOutcome::AlreadyNotified);
        assert_eq!(store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn unique_key_catches_a_race_past_the_check() {
        let store = InMemoryStore::new();
        let user = Uuid::from_u128(1);
        let ledger = NotificationLedger::new(&store);
        ledger.record(user, &candidate(), noon()).await.unwrap();

        // A concurrent producer that passed its check before the insert.
        let key = candidate().idempotency_key(user);
        let dup = NewNotification {
            user_id: user,
            message: TOMORROW_REMINDER_MESSAGE.to_string(),
            payload: NotificationPayload::TomorrowReminder,
            idempotency_key: key,
            created_at: noon(),
        };
        assert!(store.insert_notification(&dup).await.unwrap().is_none());
        assert_eq!(store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn failed_check_skips_without_inserting() {
        let store = InMemoryStore::new();
        store.fail_ledger_checks(true);
        let ledger = NotificationLedger::new(&store);

        let outcome = ledger
            .record(Uuid::from_u128(1), &candidate(), noon())
            .await
            .unwrap();
        assert_matches!(outcome, LedgerOutcome::CheckFailed(StoreError::Unavailable(_)));
        assert!(store.notifications().is_empty());
    }
}
