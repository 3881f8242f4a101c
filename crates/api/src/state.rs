use std::sync::Arc;

use satprep_core::clock::Clock;
use satprep_core::error::CoreError;
use satprep_db::ReminderStore;
use satprep_events::{EmailSender, EventBus};

use crate::config::ServerConfig;
use crate::error::AppResult;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Reminder store. `None` when no database is configured; job endpoints
    /// then fail with a configuration error instead of processing.
    pub store: Option<Arc<dyn ReminderStore>>,
    pub clock: Arc<dyn Clock>,
    /// Outbound email. `None` disables email without failing runs.
    pub email: Option<Arc<dyn EmailSender>>,
    /// In-process change feed for realtime subscribers.
    pub event_bus: Arc<EventBus>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// The configured store, or a configuration error.
    pub fn store(&self) -> AppResult<Arc<dyn ReminderStore>> {
        self.store.clone().ok_or_else(|| {
            CoreError::Configuration("Missing database configuration (DATABASE_URL)".into()).into()
        })
    }
}
