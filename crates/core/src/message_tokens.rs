//! Legacy inline-token encoding of notification metadata.
//!
//! Older clients embedded metadata in the message text itself, e.g.
//! `"Your math plan is starting at 09:00. {{planId:...}} {{type:plan_start}} {{endTime:10:00}}"`.
//! New rows carry a typed payload column instead; this module only reads
//! the old format and strips the tokens before display.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::reminder::NotificationPayload;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+):([^}]*)\}\}").expect("valid regex"));

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Metadata recovered from a legacy message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyTokens {
    pub plan_id: Option<Uuid>,
    pub kind: Option<String>,
    pub end_time: Option<String>,
    pub go_to_plan: bool,
}

/// Extract every recognised token from `message`.
///
/// Unknown token names and malformed plan ids are ignored.
pub fn parse(message: &str) -> LegacyTokens {
    let mut tokens = LegacyTokens::default();
    for caps in TOKEN_RE.captures_iter(message) {
        let value = caps[2].trim();
        match &caps[1] {
            "planId" => tokens.plan_id = Uuid::parse_str(value).ok(),
            "type" => tokens.kind = Some(value.to_string()),
            "endTime" => tokens.end_time = Some(value.to_string()),
            "goToPlan" => tokens.go_to_plan = value == "true",
            _ => {}
        }
    }
    tokens
}

/// Remove all `{{name:value}}` tokens and tidy the remaining whitespace.
pub fn strip(message: &str) -> String {
    let without = TOKEN_RE.replace_all(message, "");
    SPACE_RE.replace_all(without.trim(), " ").into_owned()
}

/// Rebuild a typed payload from a legacy message, when enough tokens exist.
pub fn decode_payload(message: &str) -> Option<NotificationPayload> {
    let tokens = parse(message);
    match tokens.kind.as_deref()? {
        "plan_start" => Some(NotificationPayload::PlanStart {
            plan_id: tokens.plan_id?,
            date: None,
            start_time: None,
            end_time: tokens.end_time?,
        }),
        "plan_missed" => Some(NotificationPayload::PlanMissed {
            plan_id: tokens.plan_id?,
            date: None,
            end_time: tokens.end_time.unwrap_or_default(),
        }),
        "tomorrow_reminder" => Some(NotificationPayload::TomorrowReminder),
        _ => None,
    }
}
