//! User directory entry.

use satprep_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table. Owned by the auth directory; read-only here.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: Option<String>,
    pub created_at: Timestamp,
}
