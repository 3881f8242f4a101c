//! Integration tests for `POST /api/dispatch_notifications`.
//!
//! Run against the in-memory store with a fixed clock so every scenario is
//! pinned to a known wall-clock time.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Duration as ChronoDuration;
use common::{body_json, dispatch_counts, post, RecordingSender, TestHarness, TODAY, TOMORROW};
use satprep_core::clock::Clock;
use satprep_core::reminder::{NotificationPayload, TOMORROW_REMINDER_MESSAGE};
use satprep_db::models::cron_log::{JOB_DISPATCH, STATUS_ERROR, STATUS_SUCCESS};
use satprep_db::models::daily_log::STATUS_DONE;
use satprep_events::ChangeEvent;

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plan_in_progress_without_tomorrow_plan() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");

    let (processed, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((processed, created, emailed), (1, 2, 2));

    let mut messages: Vec<_> = h
        .store
        .notifications_for(user.id)
        .into_iter()
        .map(|n| n.message)
        .collect();
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "You have not created a SAT study plan for tomorrow.".to_string(),
            "Your math plan is starting at 09:00.".to_string(),
        ]
    );

    let sent = h.email.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|e| e.to == "student@example.com"));
}

#[tokio::test]
async fn second_run_the_same_day_creates_nothing() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");

    dispatch_counts(h.dispatch().await).await;
    h.at("09:20");
    let (processed, created, emailed) = dispatch_counts(h.dispatch().await).await;

    assert_eq!((processed, created, emailed), (1, 0, 0));
    assert_eq!(h.store.notifications().len(), 2);
}

#[tokio::test]
async fn ended_plan_yields_missed_check_in() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");
    h.store.add_plan(user.id, TOMORROW, "reading", "09:00", "10:00");
    h.at("10:05");

    let (_, created, _) = dispatch_counts(h.dispatch().await).await;
    assert_eq!(created, 1);

    let rows = h.store.notifications_for(user.id);
    assert_eq!(
        rows[0].message,
        "Your math plan ending at 10:00 has no check-in."
    );
    assert!(matches!(
        rows[0].resolved_payload(),
        Some(NotificationPayload::PlanMissed { ref end_time, .. }) if end_time == "10:00"
    ));
}

#[tokio::test]
async fn start_then_missed_are_distinct_events() {
    let h = TestHarness::new();
    let user = h.store.add_user(None);
    h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");
    h.store.add_plan(user.id, TOMORROW, "math", "09:00", "10:00");

    dispatch_counts(h.dispatch().await).await;
    h.at("10:05");
    dispatch_counts(h.dispatch().await).await;

    let kinds: Vec<_> = h
        .store
        .notifications_for(user.id)
        .iter()
        .filter_map(|n| n.resolved_payload())
        .map(|p| p.kind())
        .collect();
    assert_eq!(kinds, vec!["plan_start", "plan_missed"]);
}

#[tokio::test]
async fn checked_in_plans_are_never_reminded() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    let plan = h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");
    h.store.add_plan(user.id, TOMORROW, "math", "09:00", "10:00");
    h.store.add_log(&plan, STATUS_DONE);
    h.at("10:05");

    let (_, created, _) = dispatch_counts(h.dispatch().await).await;
    assert_eq!(created, 0);
}

#[tokio::test]
async fn plans_before_their_start_are_not_reminded() {
    let h = TestHarness::new();
    let user = h.store.add_user(None);
    h.store.add_plan(user.id, TODAY, "math", "13:00", "14:00");
    h.store.add_plan(user.id, TOMORROW, "math", "09:00", "10:00");

    let (_, created, _) = dispatch_counts(h.dispatch().await).await;
    assert_eq!(created, 0);
}

#[tokio::test]
async fn edited_start_time_yields_a_fresh_reminder() {
    let h = TestHarness::new();
    let user = h.store.add_user(None);
    let plan = h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");
    h.store.add_plan(user.id, TOMORROW, "math", "09:00", "10:00");

    dispatch_counts(h.dispatch().await).await;
    h.store.set_plan_times(plan.id, "09:10", "10:00");
    h.at("09:20");
    let (_, created, _) = dispatch_counts(h.dispatch().await).await;

    assert_eq!(created, 1);
    assert_eq!(
        h.store.notifications_for(user.id)[1].message,
        "Your math plan is starting at 09:10."
    );
}

// ---------------------------------------------------------------------------
// Email decision
// ---------------------------------------------------------------------------

#[tokio::test]
async fn users_active_since_creation_are_not_emailed() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    h.store
        .set_last_seen(user.id, h.clock.now() + ChronoDuration::minutes(1));

    let (_, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((created, emailed), (1, 0));
    assert!(h.email.sent().is_empty());
}

#[tokio::test]
async fn users_away_since_before_creation_are_emailed() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    h.store
        .set_last_seen(user.id, h.clock.now() - ChronoDuration::hours(3));

    let (_, _, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!(emailed, 1);

    let sent = h.email.sent();
    assert_eq!(sent[0].subject, "Plan tomorrow's SAT study session");
    assert!(sent[0].html.contains(TOMORROW_REMINDER_MESSAGE));
    assert!(sent[0].html.contains("https://app.example.com/plan"));
}

#[tokio::test]
async fn users_without_address_get_notifications_only() {
    let h = TestHarness::new();
    h.store.add_user(None);

    let (_, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((created, emailed), (1, 0));
}

#[tokio::test]
async fn email_failures_do_not_fail_the_run() {
    let h = TestHarness::new().with_email(RecordingSender::failing());
    h.store.add_user(Some("a@example.com"));
    h.store.add_user(Some("b@example.com"));

    let (processed, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((processed, created, emailed), (2, 2, 0));
    assert_eq!(h.store.cron_logs()[0].status, STATUS_SUCCESS);
}

#[tokio::test]
async fn missing_email_transport_skips_email() {
    let h = TestHarness::new().without_email();
    h.store.add_user(Some("a@example.com"));

    let (_, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((created, emailed), (1, 0));
}

#[tokio::test]
async fn email_fan_out_is_bounded() {
    let h = TestHarness::new()
        .with_email(RecordingSender::slow(Duration::from_millis(20)))
        .with_concurrency(2);
    for i in 0..6 {
        h.store.add_user(Some(&format!("user{i}@example.com")));
    }

    let (_, _, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!(emailed, 6);
    assert!(h.email.peak_concurrency() <= 2);
    assert!(h.email.peak_concurrency() >= 1);
}

// ---------------------------------------------------------------------------
// Isolation, audit and failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failing_user_does_not_stop_the_others() {
    let h = TestHarness::new();
    let broken = h.store.add_user(Some("broken@example.com"));
    let healthy = h.store.add_user(Some("healthy@example.com"));
    h.store.fail_plans_for(broken.id);

    let (processed, created, _) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((processed, created), (2, 1));
    assert!(h.store.notifications_for(broken.id).is_empty());
    assert_eq!(h.store.notifications_for(healthy.id).len(), 1);
}

#[tokio::test]
async fn failed_log_query_still_runs_the_tomorrow_check() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("student@example.com"));
    h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");
    h.store.fail_logs_for(user.id);

    let (processed, created, _) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((processed, created), (1, 1));

    let notifications = h.store.notifications_for(user.id);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, TOMORROW_REMINDER_MESSAGE);
}

#[tokio::test]
async fn failed_ledger_checks_skip_events() {
    let h = TestHarness::new();
    h.store.add_user(Some("a@example.com"));
    h.store.fail_ledger_checks(true);

    let (processed, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((processed, created, emailed), (1, 0, 0));
    assert!(h.store.notifications().is_empty());
}

#[tokio::test]
async fn zero_users_is_a_successful_empty_run() {
    let h = TestHarness::new();

    let (processed, created, emailed) = dispatch_counts(h.dispatch().await).await;
    assert_eq!((processed, created, emailed), (0, 0, 0));

    let logs = h.store.cron_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].job, JOB_DISPATCH);
    assert_eq!(logs[0].status, STATUS_SUCCESS);
    assert_eq!(logs[0].users_processed, 0);
}

#[tokio::test]
async fn successful_run_is_audited_with_counts() {
    let h = TestHarness::new();
    let user = h.store.add_user(Some("a@example.com"));
    h.store.add_plan(user.id, TODAY, "math", "09:00", "10:00");

    dispatch_counts(h.dispatch().await).await;

    let log = &h.store.cron_logs()[0];
    assert_eq!(log.status, STATUS_SUCCESS);
    assert_eq!(
        (log.users_processed, log.notifications_created, log.emails_sent),
        (1, 2, 2)
    );
    assert_eq!(log.run_at, h.clock.now());
}

#[tokio::test]
async fn directory_failure_returns_500_and_audits_the_error() {
    let h = TestHarness::new();
    h.store.fail_user_listing(true);

    let response = h.dispatch().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("user listing"));

    let logs = h.store.cron_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, STATUS_ERROR);
    assert!(logs[0].error_message.is_some());
}

#[tokio::test]
async fn audit_write_failure_surfaces_as_500() {
    let h = TestHarness::new();
    h.store.add_user(None);
    h.store.fail_cron_log(true);

    let response = h.dispatch().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // Notifications committed before the audit failure stay committed.
    assert_eq!(h.store.notifications().len(), 1);
}

#[tokio::test]
async fn missing_store_is_a_configuration_error() {
    let h = TestHarness::new().without_store();

    let response = h.dispatch().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("DATABASE_URL"));
}

#[tokio::test]
async fn created_notifications_are_published() {
    let h = TestHarness::new();
    let user = h.store.add_user(None);
    let mut rx = h.event_bus.subscribe();

    dispatch_counts(h.dispatch().await).await;

    let event = rx.recv().await.unwrap();
    let ChangeEvent::NotificationInserted {
        user_id,
        notification_id,
        ..
    } = event;
    assert_eq!(user_id, user.id);
    assert_eq!(h.store.notifications()[0].id, notification_id);
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn secret_is_required_when_configured() {
    let h = TestHarness::new().with_secret("s3cret");

    let response = post(h.app(), "/api/dispatch_notifications", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Unauthorized" })
    );

    let response = post(h.app(), "/api/dispatch_notifications", Some("wrong")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.store.cron_logs().is_empty());

    let response = post(h.app(), "/api/dispatch_notifications", Some("s3cret")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn endpoint_is_open_without_a_secret() {
    let h = TestHarness::new();
    let response = post(h.app(), "/api/dispatch_notifications", Some("anything")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthorized_check_precedes_configuration_check() {
    let h = TestHarness::new().with_secret("s3cret").without_store();
    let response = post(h.app(), "/api/dispatch_notifications", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
