//! Outbound delivery channels for reminder notifications.

pub mod email;
pub mod template;
