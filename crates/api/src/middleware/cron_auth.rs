//! Shared-secret authorization for scheduler-triggered endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use satprep_core::error::CoreError;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the caller presented `Authorization: Bearer <CRON_SECRET>`.
///
/// When no secret is configured every request passes.
///
/// ```ignore
/// async fn job(_auth: CronAuth, State(state): State<AppState>) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.cron_secret.as_deref() else {
            return Ok(CronAuth);
        };

        let presented = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if secrets_match(token, secret) => Ok(CronAuth),
            _ => {
                tracing::warn!("Rejected job request with missing or wrong cron secret");
                Err(AppError::Core(CoreError::Unauthorized(
                    "Invalid cron secret".into(),
                )))
            }
        }
    }
}

/// Compare digests so the comparison time does not depend on the secret.
fn secrets_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
