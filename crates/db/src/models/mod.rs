//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and, where rows are written, a create DTO.

pub mod cron_log;
pub mod daily_log;
pub mod notification;
pub mod study_plan;
pub mod user;
pub mod user_activity;
pub mod user_profile;
