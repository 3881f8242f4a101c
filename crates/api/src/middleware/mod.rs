//! Request extractors guarding the batch job endpoints.
//!
//! - [`cron_auth::CronAuth`]: requires the shared cron secret when one is
//!   configured.

pub mod cron_auth;
