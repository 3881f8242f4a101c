//! Integration tests for the notification ledger, audit log and premium
//! profile queries.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use satprep_core::reminder::{NotificationPayload, ReminderCandidate, TOMORROW_REMINDER_MESSAGE};
use satprep_core::types::Timestamp;
use satprep_db::models::cron_log::{NewCronLog, JOB_DISPATCH, JOB_PREMIUM_EXPIRY, STATUS_ERROR};
use satprep_db::models::notification::NewNotification;
use satprep_db::repositories::{CronLogRepo, NotificationRepo, UserProfileRepo, UserRepo};
use satprep_db::{LedgerOutcome, NotificationLedger, PgReminderStore};
use sqlx::PgPool;

fn noon() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn tomorrow_candidate() -> ReminderCandidate {
    ReminderCandidate::new(
        TOMORROW_REMINDER_MESSAGE,
        NotificationPayload::TomorrowReminder,
        "2026-03-14",
    )
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ledger_records_once_per_day(pool: PgPool) {
    let user = UserRepo::create(&pool, Some("a@example.com")).await.unwrap();
    let store = PgReminderStore::new(pool.clone());
    let ledger = NotificationLedger::new(&store);

    let first = ledger.record(user.id, &tomorrow_candidate(), noon()).await.unwrap();
    assert_matches!(first, LedgerOutcome::Created(ref n) if n.payload.is_some());

    let second = ledger
        .record(user.id, &tomorrow_candidate(), noon() + Duration::hours(1))
        .await
        .unwrap();
    assert_matches!(second, LedgerOutcome::AlreadyNotified);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn conflicting_key_insert_returns_none(pool: PgPool) {
    let user = UserRepo::create(&pool, None).await.unwrap();
    let input = NewNotification {
        user_id: user.id,
        message: TOMORROW_REMINDER_MESSAGE.to_string(),
        payload: NotificationPayload::TomorrowReminder,
        idempotency_key: tomorrow_candidate().idempotency_key(user.id),
        created_at: noon(),
    };

    assert!(NotificationRepo::insert_if_absent(&pool, &input)
        .await
        .unwrap()
        .is_some());
    assert!(NotificationRepo::insert_if_absent(&pool, &input)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn existence_check_is_bounded_by_since(pool: PgPool) {
    let user = UserRepo::create(&pool, None).await.unwrap();
    let key = tomorrow_candidate().idempotency_key(user.id);
    let input = NewNotification {
        user_id: user.id,
        message: TOMORROW_REMINDER_MESSAGE.to_string(),
        payload: NotificationPayload::TomorrowReminder,
        idempotency_key: key.clone(),
        created_at: noon(),
    };
    NotificationRepo::insert_if_absent(&pool, &input).await.unwrap();

    assert!(NotificationRepo::exists_since(&pool, user.id, &key, noon() - Duration::hours(12))
        .await
        .unwrap());
    assert!(!NotificationRepo::exists_since(&pool, user.id, &key, noon() + Duration::hours(1))
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dismissed_rows_leave_the_unread_list(pool: PgPool) {
    let user = UserRepo::create(&pool, None).await.unwrap();
    let store = PgReminderStore::new(pool.clone());
    let ledger = NotificationLedger::new(&store);
    let created = match ledger.record(user.id, &tomorrow_candidate(), noon()).await.unwrap() {
        LedgerOutcome::Created(n) => n,
        other => panic!("expected Created, got {other:?}"),
    };

    let since = noon() - Duration::hours(12);
    let unread = NotificationRepo::list_unread_since(&pool, user.id, since).await.unwrap();
    assert_eq!(unread.len(), 1);

    assert!(NotificationRepo::dismiss(&pool, created.id, user.id, noon()).await.unwrap());
    assert!(!NotificationRepo::dismiss(&pool, created.id, user.id, noon()).await.unwrap());
    let unread = NotificationRepo::list_unread_since(&pool, user.id, since).await.unwrap();
    assert!(unread.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dismiss_requires_ownership(pool: PgPool) {
    let owner = UserRepo::create(&pool, None).await.unwrap();
    let other = UserRepo::create(&pool, None).await.unwrap();
    let store = PgReminderStore::new(pool.clone());
    let ledger = NotificationLedger::new(&store);
    let created = match ledger.record(owner.id, &tomorrow_candidate(), noon()).await.unwrap() {
        LedgerOutcome::Created(n) => n,
        other => panic!("expected Created, got {other:?}"),
    };

    assert!(!NotificationRepo::dismiss(&pool, created.id, other.id, noon()).await.unwrap());
}

// ---------------------------------------------------------------------------
// Cron log
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn cron_logs_are_listed_per_job(pool: PgPool) {
    CronLogRepo::insert(&pool, &NewCronLog::success(JOB_DISPATCH, noon(), 3, 2, 1))
        .await
        .unwrap();
    CronLogRepo::insert(
        &pool,
        &NewCronLog::error(JOB_DISPATCH, noon() + Duration::hours(1), "directory down"),
    )
    .await
    .unwrap();
    CronLogRepo::insert(&pool, &NewCronLog::success(JOB_PREMIUM_EXPIRY, noon(), 1, 1, 0))
        .await
        .unwrap();

    let runs = CronLogRepo::list_recent(&pool, JOB_DISPATCH, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].status, STATUS_ERROR);
    assert_eq!(runs[0].error_message.as_deref(), Some("directory down"));
    assert_eq!(runs[1].users_processed, 3);
}

// ---------------------------------------------------------------------------
// Premium
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn premium_expiry_listing_and_revocation(pool: PgPool) {
    let soon = UserRepo::create(&pool, None).await.unwrap();
    let later = UserRepo::create(&pool, None).await.unwrap();
    let free = UserRepo::create(&pool, None).await.unwrap();
    UserProfileRepo::upsert_premium(&pool, soon.id, true, Some(noon() + Duration::hours(2)))
        .await
        .unwrap();
    UserProfileRepo::upsert_premium(&pool, later.id, true, Some(noon() + Duration::days(10)))
        .await
        .unwrap();
    UserProfileRepo::upsert_premium(&pool, free.id, false, Some(noon()))
        .await
        .unwrap();

    let expiring = UserProfileRepo::list_premium_expiring_before(&pool, noon() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].user_id, soon.id);

    assert!(UserProfileRepo::revoke_premium(&pool, soon.id).await.unwrap());
    assert!(!UserProfileRepo::revoke_premium(&pool, soon.id).await.unwrap());
}
