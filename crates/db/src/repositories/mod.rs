//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod cron_log_repo;
pub mod daily_log_repo;
pub mod notification_repo;
pub mod study_plan_repo;
pub mod user_activity_repo;
pub mod user_profile_repo;
pub mod user_repo;

pub use cron_log_repo::CronLogRepo;
pub use daily_log_repo::DailyLogRepo;
pub use notification_repo::NotificationRepo;
pub use study_plan_repo::StudyPlanRepo;
pub use user_activity_repo::UserActivityRepo;
pub use user_profile_repo::UserProfileRepo;
pub use user_repo::UserRepo;
