pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(jobs::router())
}
