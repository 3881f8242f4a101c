//! Reminder event detection.
//!
//! Given one user's plans for today and tomorrow, the plan ids already
//! checked in today, and the current wall-clock reading, the detector
//! produces the reminder events that are due. It performs no I/O: the
//! ledger check, persistence and email decision belong to the callers
//! (the dispatch orchestrator and the client mirror).

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::idempotency;
use crate::timeutil::{has_time_passed, local_date};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed text of the missing-plan-for-tomorrow reminder.
pub const TOMORROW_REMINDER_MESSAGE: &str = "You have not created a SAT study plan for tomorrow.";

/// Notification text sent when a premium subscription lapses.
pub const PREMIUM_EXPIRED_MESSAGE: &str = "Your SAT Prep premium subscription has expired.";

/// Notification text sent when a premium subscription is about to lapse.
pub const PREMIUM_EXPIRING_MESSAGE: &str =
    "Your SAT Prep premium subscription expires within 24 hours.";

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Typed payload stored alongside a notification's display text.
///
/// Serialized into the `notifications.payload` JSONB column with a `kind`
/// tag, e.g. `{"kind":"plan_missed","plan_id":"...","end_time":"10:00"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A plan's start time has passed and it is still running.
    PlanStart {
        plan_id: DbId,
        /// Plan date; absent on rows decoded from legacy message tokens.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<String>,
        end_time: String,
    },
    /// A plan's end time has passed without a check-in.
    PlanMissed {
        plan_id: DbId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
        end_time: String,
    },
    /// No plan exists for tomorrow.
    TomorrowReminder,
    /// Premium access was revoked.
    PremiumExpired,
    /// Premium access lapses soon.
    PremiumExpiring { expires_at: Timestamp },
}

impl NotificationPayload {
    /// Wire name of the event kind (matches the serde tag).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlanStart { .. } => "plan_start",
            Self::PlanMissed { .. } => "plan_missed",
            Self::TomorrowReminder => "tomorrow_reminder",
            Self::PremiumExpired => "premium_expired",
            Self::PremiumExpiring { .. } => "premium_expiring",
        }
    }

    /// The plan this event refers to, if any.
    pub fn plan_id(&self) -> Option<DbId> {
        match self {
            Self::PlanStart { plan_id, .. } | Self::PlanMissed { plan_id, .. } => Some(*plan_id),
            _ => None,
        }
    }

    /// Whether the UI should offer a jump to the plan screen.
    pub fn links_to_plan(&self) -> bool {
        matches!(
            self,
            Self::PlanStart { .. } | Self::PlanMissed { .. } | Self::TomorrowReminder
        )
    }

    /// The plan time this event is anchored to, used in the idempotency key.
    pub fn anchor(&self) -> String {
        match self {
            Self::PlanStart { start_time, end_time, .. } => {
                format!("{}-{end_time}", start_time.as_deref().unwrap_or(""))
            }
            Self::PlanMissed { end_time, .. } => end_time.clone(),
            Self::PremiumExpiring { expires_at } => expires_at.to_rfc3339(),
            Self::TomorrowReminder | Self::PremiumExpired => String::new(),
        }
    }

    /// Whether a plan-start event's window has already closed.
    ///
    /// `today` stands in for the plan date on legacy rows that did not
    /// record one. Every other kind is never stale.
    pub fn is_stale(&self, today: &str, now: NaiveDateTime) -> bool {
        match self {
            Self::PlanStart { date, end_time, .. } => {
                has_time_passed(end_time, date.as_deref().unwrap_or(today), now)
            }
            _ => false,
        }
    }

    /// Email subject line for this event.
    pub fn email_subject(&self) -> &'static str {
        match self {
            Self::PlanStart { .. } => "Your SAT study session is starting",
            Self::PlanMissed { .. } => "You missed a study check-in",
            Self::TomorrowReminder => "Plan tomorrow's SAT study session",
            Self::PremiumExpired => "Your premium subscription has expired",
            Self::PremiumExpiring { .. } => "Your premium subscription expires soon",
        }
    }
}

// ---------------------------------------------------------------------------
// Detector input / output
// ---------------------------------------------------------------------------

/// The fields of a study plan the detector looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSlot {
    pub id: DbId,
    pub date: String,
    pub section: String,
    pub start_time: String,
    pub end_time: String,
}

/// Which producer is phrasing the messages.
///
/// The batch job and the in-app mirror word the missed check-in reminder
/// differently; the idempotency key is the same for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrasing {
    Dispatch,
    Mirror,
}

/// A reminder that is due and not yet checked against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCandidate {
    /// Display text stored in `notifications.message`.
    pub message: String,
    pub payload: NotificationPayload,
    /// Local calendar day the event belongs to.
    pub day: String,
}

impl ReminderCandidate {
    /// Build a candidate for an arbitrary payload.
    pub fn new(message: impl Into<String>, payload: NotificationPayload, day: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload,
            day: day.into(),
        }
    }

    /// Synthetic idempotency key for this event and user.
    pub fn idempotency_key(&self, user_id: DbId) -> String {
        idempotency::event_key(user_id, &self.payload, &self.day)
    }
}

/// Message for a plan that has started.
pub fn plan_start_message(section: &str, start_time: &str) -> String {
    format!("Your {section} plan is starting at {start_time}.")
}

/// Message for a plan that ended without a check-in.
pub fn plan_missed_message(section: &str, end_time: &str, phrasing: Phrasing) -> String {
    match phrasing {
        Phrasing::Dispatch => format!("Your {section} plan ending at {end_time} has no check-in."),
        Phrasing::Mirror => {
            format!("Your {section} plan ended at {end_time} and hasn't been checked in yet.")
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Evaluate today's plans.
///
/// Per plan without a log: a start event while `start <= now < end`, a
/// missed check-in event once `now >= end`. Plans with a log are skipped
/// regardless of time.
pub fn detect_plan_events(
    today_plans: &[PlanSlot],
    logged_plan_ids: &HashSet<DbId>,
    now: NaiveDateTime,
    phrasing: Phrasing,
) -> Vec<ReminderCandidate> {
    let mut candidates = Vec::new();

    for plan in today_plans {
        if logged_plan_ids.contains(&plan.id) {
            continue;
        }

        let started = has_time_passed(&plan.start_time, &plan.date, now);
        let ended = has_time_passed(&plan.end_time, &plan.date, now);

        if ended {
            candidates.push(ReminderCandidate::new(
                plan_missed_message(&plan.section, &plan.end_time, phrasing),
                NotificationPayload::PlanMissed {
                    plan_id: plan.id,
                    date: Some(plan.date.clone()),
                    end_time: plan.end_time.clone(),
                },
                plan.date.clone(),
            ));
        } else if started {
            candidates.push(ReminderCandidate::new(
                plan_start_message(&plan.section, &plan.start_time),
                NotificationPayload::PlanStart {
                    plan_id: plan.id,
                    date: Some(plan.date.clone()),
                    start_time: Some(plan.start_time.clone()),
                    end_time: plan.end_time.clone(),
                },
                plan.date.clone(),
            ));
        }
    }

    candidates
}

/// The once-per-user reminder, due iff no plan is dated tomorrow.
pub fn detect_tomorrow_gap(
    tomorrow_plans: &[PlanSlot],
    now: NaiveDateTime,
) -> Option<ReminderCandidate> {
    tomorrow_plans.is_empty().then(|| {
        ReminderCandidate::new(
            TOMORROW_REMINDER_MESSAGE,
            NotificationPayload::TomorrowReminder,
            local_date(now),
        )
    })
}

/// Run both detections for one user.
pub fn detect(
    today_plans: &[PlanSlot],
    tomorrow_plans: &[PlanSlot],
    logged_plan_ids: &HashSet<DbId>,
    now: NaiveDateTime,
    phrasing: Phrasing,
) -> Vec<ReminderCandidate> {
    let mut candidates = detect_plan_events(today_plans, logged_plan_ids, now, phrasing);
    candidates.extend(detect_tomorrow_gap(tomorrow_plans, now));
    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
