//! Integration tests for `POST /api/premium_expiry`.

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, post, TestHarness};
use satprep_core::clock::Clock;
use satprep_core::reminder::{PREMIUM_EXPIRED_MESSAGE, PREMIUM_EXPIRING_MESSAGE};
use satprep_db::models::cron_log::{JOB_PREMIUM_EXPIRY, STATUS_SUCCESS};

async fn run(h: &TestHarness) -> serde_json::Value {
    let response = post(h.app(), "/api/premium_expiry", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn expired_profiles_are_revoked_and_notified() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("lapsed@example.com"));
    h.store
        .add_profile(user.id, true, Some(h.clock.now() - Duration::hours(1)));

    let json = run(&h).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["processed"], 1);
    assert_eq!(json["revoked"], 1);
    assert_eq!(json["warned"], 0);
    assert_eq!(json["emails_sent"], 1);

    assert!(!h.store.profile(user.id).unwrap().is_premium);
    assert_eq!(
        h.store.notifications_for(user.id)[0].message,
        PREMIUM_EXPIRED_MESSAGE
    );
}

#[tokio::test]
async fn expiring_profiles_are_warned_once() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("soon@example.com"));
    h.store
        .add_profile(user.id, true, Some(h.clock.now() + Duration::hours(5)));

    let first = run(&h).await;
    assert_eq!(first["warned"], 1);
    assert_eq!(first["revoked"], 0);

    h.clock.advance(Duration::hours(2));
    let second = run(&h).await;
    assert_eq!(second["warned"], 0);

    let rows = h.store.notifications_for(user.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message, PREMIUM_EXPIRING_MESSAGE);
    assert!(h.store.profile(user.id).unwrap().is_premium);
}

#[tokio::test]
async fn distant_and_free_profiles_are_left_alone() {
    let h = TestHarness::new();
    let later = h.store.add_user(None);
    let free = h.store.add_user(None);
    h.store
        .add_profile(later.id, true, Some(h.clock.now() + Duration::days(30)));
    h.store
        .add_profile(free.id, false, Some(h.clock.now() - Duration::days(1)));

    let json = run(&h).await;
    assert_eq!(json["processed"], 0);
    assert!(h.store.notifications().is_empty());
}

#[tokio::test]
async fn run_is_audited_under_its_own_job() {
    let h = TestHarness::new();
    let user = h.store.add_user(None);
    h.store
        .add_profile(user.id, true, Some(h.clock.now() - Duration::minutes(1)));

    run(&h).await;

    let logs = h.store.cron_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].job, JOB_PREMIUM_EXPIRY);
    assert_eq!(logs[0].status, STATUS_SUCCESS);
    assert_eq!(logs[0].notifications_created, 1);
}

#[tokio::test]
async fn premium_expiry_requires_the_secret() {
    let h = TestHarness::new().with_secret("s3cret");
    let response = post(h.app(), "/api/premium_expiry", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post(h.app(), "/api/premium_expiry", Some("s3cret")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
