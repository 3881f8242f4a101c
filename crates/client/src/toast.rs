//! In-app toast presentation of notifications.
//!
//! A toast is transient: it expires after [`TOAST_TTL_SECS`] without
//! touching the notification row. Marking the row read is the separate
//! [`ToastTray::dismiss`] action.

use chrono::Duration;
use satprep_core::reminder::NotificationPayload;
use satprep_core::types::{DbId, Timestamp};
use satprep_db::models::notification::Notification;
use satprep_db::{ReminderStore, StoreError};

/// How long a toast stays on screen.
pub const TOAST_TTL_SECS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub notification_id: DbId,
    pub message: String,
    pub payload: Option<NotificationPayload>,
    pub shown_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Toast {
    /// Whether the toast should offer a jump to the plan screen.
    pub fn links_to_plan(&self) -> bool {
        self.payload
            .as_ref()
            .is_some_and(NotificationPayload::links_to_plan)
    }
}

#[derive(Debug, Default)]
pub struct ToastTray {
    toasts: Vec<Toast>,
}

impl ToastTray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notification. A notification already on screen is not shown twice.
    pub fn push(&mut self, notification: &Notification, now: Timestamp) -> bool {
        if self.toasts.iter().any(|t| t.notification_id == notification.id) {
            return false;
        }
        self.toasts.push(Toast {
            notification_id: notification.id,
            message: notification.display_text(),
            payload: notification.resolved_payload(),
            shown_at: now,
            expires_at: now + Duration::seconds(TOAST_TTL_SECS),
        });
        true
    }

    /// Drop toasts whose time is up, returning how many were removed.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at > now);
        before - self.toasts.len()
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Close a toast and mark its notification read.
    ///
    /// Returns whether the store dismissed a row. The toast is removed even
    /// if the row was already dismissed elsewhere.
    pub async fn dismiss(
        &mut self,
        store: &dyn ReminderStore,
        user_id: DbId,
        notification_id: DbId,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        let dismissed = store
            .dismiss_notification(user_id, notification_id, now)
            .await?;
        self.toasts.retain(|t| t.notification_id != notification_id);
        Ok(dismissed)
    }
}
