//! In-memory [`ReminderStore`] for tests and offline development.
//!
//! Mirrors the Postgres semantics that matter to the reminder engine (the
//! unique idempotency key, unread filtering, premium revocation) and can
//! be told to fail specific operations to exercise error paths.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use satprep_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::models::cron_log::NewCronLog;
use crate::models::daily_log::DailyLog;
use crate::models::notification::{NewNotification, Notification};
use crate::models::study_plan::StudyPlan;
use crate::models::user::User;
use crate::models::user_profile::UserProfile;
use crate::store::{ReminderStore, StoreError, StoreResult};

#[derive(Default)]
struct State {
    users: Vec<User>,
    plans: Vec<StudyPlan>,
    logs: Vec<DailyLog>,
    notifications: Vec<Notification>,
    activity: Vec<(DbId, Timestamp)>,
    profiles: Vec<UserProfile>,
    cron_logs: Vec<NewCronLog>,
    failures: Failures,
}

#[derive(Default)]
struct Failures {
    user_listing: bool,
    ledger_checks: bool,
    cron_log: bool,
    plans_for: HashSet<DbId>,
    logs_for: HashSet<DbId>,
}

/// A [`ReminderStore`] held entirely in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Seeding -------------------------------------------------------------

    /// Add a directory entry.
    pub fn add_user(&self, email: Option<&str>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    /// Add a plan for `user_id` on `date` from `start_time` to `end_time`.
    pub fn add_plan(
        &self,
        user_id: DbId,
        date: &str,
        section: &str,
        start_time: &str,
        end_time: &str,
    ) -> StudyPlan {
        let plan = StudyPlan {
            id: Uuid::new_v4(),
            user_id,
            date: date.to_string(),
            section: section.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            tasks_text: String::new(),
            created_at: Utc::now(),
        };
        self.lock().plans.push(plan.clone());
        plan
    }

    /// Edit a plan's times in place.
    pub fn set_plan_times(&self, plan_id: DbId, start_time: &str, end_time: &str) {
        let mut state = self.lock();
        if let Some(plan) = state.plans.iter_mut().find(|p| p.id == plan_id) {
            plan.start_time = start_time.to_string();
            plan.end_time = end_time.to_string();
        }
    }

    /// Record a check-in for a plan.
    pub fn add_log(&self, plan: &StudyPlan, status: &str) -> DailyLog {
        let log = DailyLog {
            id: Uuid::new_v4(),
            user_id: plan.user_id,
            plan_id: plan.id,
            date: plan.date.clone(),
            status: status.to_string(),
            checked_at: Some(Utc::now()),
        };
        self.lock().logs.push(log.clone());
        log
    }

    /// Insert a raw notification row, bypassing the ledger (legacy data).
    pub fn add_notification(&self, notification: Notification) {
        self.lock().notifications.push(notification);
    }

    pub fn set_last_seen(&self, user_id: DbId, at: Timestamp) {
        let mut state = self.lock();
        state.activity.retain(|(id, _)| *id != user_id);
        state.activity.push((user_id, at));
    }

    pub fn add_profile(&self, user_id: DbId, is_premium: bool, expires_at: Option<Timestamp>) {
        self.lock().profiles.push(UserProfile {
            user_id,
            display_name: None,
            is_premium,
            premium_expires_at: expires_at,
            updated_at: Utc::now(),
        });
    }

    // -- Failure injection ---------------------------------------------------

    pub fn fail_user_listing(&self, fail: bool) {
        self.lock().failures.user_listing = fail;
    }

    pub fn fail_ledger_checks(&self, fail: bool) {
        self.lock().failures.ledger_checks = fail;
    }

    pub fn fail_cron_log(&self, fail: bool) {
        self.lock().failures.cron_log = fail;
    }

    /// Make plan queries for one user fail.
    pub fn fail_plans_for(&self, user_id: DbId) {
        self.lock().failures.plans_for.insert(user_id);
    }

    /// Make daily log queries for one user fail.
    pub fn fail_logs_for(&self, user_id: DbId) {
        self.lock().failures.logs_for.insert(user_id);
    }

    // -- Inspection ----------------------------------------------------------

    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    pub fn notifications_for(&self, user_id: DbId) -> Vec<Notification> {
        self.lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn cron_logs(&self) -> Vec<NewCronLog> {
        self.lock().cron_logs.clone()
    }

    pub fn profile(&self, user_id: DbId) -> Option<UserProfile> {
        self.lock()
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned()
    }
}

fn unavailable(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} failed (injected)"))
}

#[async_trait]
impl ReminderStore for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let state = self.lock();
        if state.failures.user_listing {
            return Err(unavailable("user listing"));
        }
        Ok(state.users.clone())
    }

    async fn find_user(&self, user_id: DbId) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn plans_for_date(&self, user_id: DbId, date: &str) -> StoreResult<Vec<StudyPlan>> {
        let state = self.lock();
        if state.failures.plans_for.contains(&user_id) {
            return Err(unavailable("plan query"));
        }
        let mut plans: Vec<_> = state
            .plans
            .iter()
            .filter(|p| p.user_id == user_id && p.date == date)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(plans)
    }

    async fn logs_for_date(&self, user_id: DbId, date: &str) -> StoreResult<Vec<DailyLog>> {
        let state = self.lock();
        if state.failures.logs_for.contains(&user_id) {
            return Err(unavailable("log query"));
        }
        Ok(state
            .logs
            .iter()
            .filter(|l| l.user_id == user_id && l.date == date)
            .cloned()
            .collect())
    }

    async fn notification_exists(
        &self,
        user_id: DbId,
        idempotency_key: &str,
        since: Timestamp,
    ) -> StoreResult<bool> {
        let state = self.lock();
        if state.failures.ledger_checks {
            return Err(unavailable("ledger check"));
        }
        Ok(state.notifications.iter().any(|n| {
            n.user_id == user_id
                && n.idempotency_key.as_deref() == Some(idempotency_key)
                && n.created_at >= since
        }))
    }

    async fn insert_notification(
        &self,
        input: &NewNotification,
    ) -> StoreResult<Option<Notification>> {
        let mut state = self.lock();
        let taken = state
            .notifications
            .iter()
            .any(|n| n.idempotency_key.as_deref() == Some(input.idempotency_key.as_str()));
        if taken {
            return Ok(None);
        }
        let row = Notification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            message: input.message.clone(),
            payload: Some(input.payload_json()),
            idempotency_key: Some(input.idempotency_key.clone()),
            created_at: input.created_at,
            dismissed_at: None,
        };
        state.notifications.push(row.clone());
        Ok(Some(row))
    }

    async fn unread_notifications(
        &self,
        user_id: DbId,
        since: Timestamp,
    ) -> StoreResult<Vec<Notification>> {
        let mut rows: Vec<_> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && n.is_unread() && n.created_at >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn dismiss_notification(
        &self,
        user_id: DbId,
        notification_id: DbId,
        at: Timestamp,
    ) -> StoreResult<bool> {
        let mut state = self.lock();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id && n.is_unread())
        {
            Some(n) => {
                n.dismissed_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn last_seen(&self, user_id: DbId) -> StoreResult<Option<Timestamp>> {
        Ok(self
            .lock()
            .activity
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, at)| *at))
    }

    async fn touch_activity(&self, user_id: DbId, at: Timestamp) -> StoreResult<()> {
        self.set_last_seen(user_id, at);
        Ok(())
    }

    async fn insert_cron_log(&self, entry: &NewCronLog) -> StoreResult<()> {
        let mut state = self.lock();
        if state.failures.cron_log {
            return Err(unavailable("cron log insert"));
        }
        state.cron_logs.push(entry.clone());
        Ok(())
    }

    async fn premium_expiring_before(&self, cutoff: Timestamp) -> StoreResult<Vec<UserProfile>> {
        Ok(self
            .lock()
            .profiles
            .iter()
            .filter(|p| p.is_premium && p.premium_expires_at.is_some_and(|at| at <= cutoff))
            .cloned()
            .collect())
    }

    async fn revoke_premium(&self, user_id: DbId) -> StoreResult<bool> {
        let mut state = self.lock();
        match state
            .profiles
            .iter_mut()
            .find(|p| p.user_id == user_id && p.is_premium)
        {
            Some(profile) => {
                profile.is_premium = false;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
