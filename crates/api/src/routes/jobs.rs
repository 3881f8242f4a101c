use axum::routing::post;
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Batch job triggers.
///
/// ```text
/// POST /dispatch_notifications   dispatch_notifications
/// POST /premium_expiry           premium_expiry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dispatch_notifications", post(jobs::dispatch_notifications))
        .route("/premium_expiry", post(jobs::premium_expiry))
}
