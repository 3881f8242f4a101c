//! Premium subscription expiry classification.
//!
//! Used by the premium-expiry batch job to decide which profiles lose
//! their flag and which get a warning.

use chrono::Duration;

use crate::types::Timestamp;

/// Profiles expiring within this many hours receive a warning.
pub const EXPIRY_WARNING_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumStatus {
    /// Not premium; nothing to do.
    Free,
    /// Premium with no expiry, or expiry beyond the warning window.
    Active,
    /// Premium, expiring within the warning window.
    ExpiringSoon,
    /// Premium flag still set but the expiry has passed.
    Expired,
}

/// Classify a profile at `now`.
pub fn classify(is_premium: bool, expires_at: Option<Timestamp>, now: Timestamp) -> PremiumStatus {
    if !is_premium {
        return PremiumStatus::Free;
    }
    match expires_at {
        None => PremiumStatus::Active,
        Some(at) if at <= now => PremiumStatus::Expired,
        Some(at) if at <= now + Duration::hours(EXPIRY_WARNING_WINDOW_HOURS) => {
            PremiumStatus::ExpiringSoon
        }
        Some(_) => PremiumStatus::Active,
    }
}
