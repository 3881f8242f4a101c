//! Synthetic idempotency keys for notifications.
//!
//! A notification's key is a SHA-256 digest of who it is for, what kind
//! of event it is, which plan it concerns, which local day it belongs to,
//! and the plan time it is anchored to. The key is stored in a unique
//! column so that concurrent producers cannot persist the same event
//! twice. Because the anchor includes the plan time, editing a plan's
//! start or end time yields a new key and therefore a new reminder.

use sha2::{Digest, Sha256};

use crate::reminder::NotificationPayload;
use crate::types::DbId;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Derive the idempotency key for `payload` delivered to `user_id` on `day`.
pub fn event_key(user_id: DbId, payload: &NotificationPayload, day: &str) -> String {
    let plan = payload
        .plan_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let material = format!(
        "{user_id}|{kind}|{plan}|{day}|{anchor}",
        kind = payload.kind(),
        anchor = payload.anchor(),
    );
    sha256_hex(material.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn empty_input_produces_known_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn key_is_stable_and_hex() {
        let user = Uuid::from_u128(42);
        let a = event_key(user, &NotificationPayload::TomorrowReminder, "2026-03-14");
        let b = event_key(user, &NotificationPayload::TomorrowReminder, "2026-03-14");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn key_varies_by_user_and_day() {
        let payload = NotificationPayload::TomorrowReminder;
        let base = event_key(Uuid::from_u128(1), &payload, "2026-03-14");
        assert_ne!(base, event_key(Uuid::from_u128(2), &payload, "2026-03-14"));
        assert_ne!(base, event_key(Uuid::from_u128(1), &payload, "2026-03-15"));
    }

    #[test]
    fn key_varies_by_kind_for_same_plan() {
        let user = Uuid::from_u128(1);
        let plan_id = Uuid::from_u128(7);
        let start = NotificationPayload::PlanStart {
            plan_id,
            date: None,
            start_time: Some("09:00".into()),
            end_time: "10:00".into(),
        };
        let missed = NotificationPayload::PlanMissed {
            plan_id,
            date: None,
            end_time: "10:00".into(),
        };
        assert_ne!(
            event_key(user, &start, "2026-03-14"),
            event_key(user, &missed, "2026-03-14")
        );
    }
}
