use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the store answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Whether reminder emails can go out. Missing email is not degraded.
    pub email_enabled: bool,
    /// Seconds between in-process dispatch runs, if the scheduler is on.
    pub dispatch_interval_secs: Option<u64>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match &state.store {
        Some(store) => match store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store ping failed");
                false
            }
        },
        None => false,
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        email_enabled: state.email.is_some(),
        dispatch_interval_secs: state.config.dispatch_interval_secs,
    })
}

/// Root-level routes (not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
