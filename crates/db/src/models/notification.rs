//! Notification entity model and DTOs.

use satprep_core::message_tokens;
use satprep_core::reminder::NotificationPayload;
use satprep_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    pub idempotency_key: Option<String>,
    pub created_at: Timestamp,
    pub dismissed_at: Option<Timestamp>,
}

impl Notification {
    /// Typed payload, falling back to legacy inline tokens in `message`.
    pub fn resolved_payload(&self) -> Option<NotificationPayload> {
        self.payload
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .or_else(|| message_tokens::decode_payload(&self.message))
    }

    /// Message text with any legacy tokens removed.
    pub fn display_text(&self) -> String {
        message_tokens::strip(&self.message)
    }

    pub fn is_unread(&self) -> bool {
        self.dismissed_at.is_none()
    }
}

/// DTO for inserting a notification through the ledger.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: DbId,
    pub message: String,
    pub payload: NotificationPayload,
    pub idempotency_key: String,
    pub created_at: Timestamp,
}

impl NewNotification {
    /// The payload as stored in the JSONB column.
    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}
