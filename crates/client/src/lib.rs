//! Client-side pieces of the reminder engine.
//!
//! - [`mirror::ReminderMirror`]: per-user detector that runs on a poll and
//!   on change-feed inserts, writing through the shared ledger and turning
//!   unread notifications into toasts.
//! - [`toast::ToastTray`]: the short-lived in-app presentation of
//!   notifications.
//! - [`local_store`]: device-local key-value persistence.
//! - [`focus_session::FocusSession`]: the interval timer with its resume
//!   state persisted locally.

pub mod focus_session;
pub mod local_store;
pub mod mirror;
pub mod toast;

pub use focus_session::{FocusError, FocusSession, SessionBinding};
pub use local_store::{JsonFileStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use mirror::{CycleReport, MirrorHandle, ReminderMirror};
pub use toast::{Toast, ToastTray};
