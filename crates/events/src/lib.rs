//! Change feed and outbound delivery for reminder notifications.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying [`ChangeEvent`]s to realtime
//!   subscribers.
//! - [`delivery`]: the [`EmailSender`] seam with an HTTP provider and an
//!   SMTP fallback, plus the HTML rendering of reminder emails.

pub mod bus;
pub mod delivery;

pub use bus::{ChangeEvent, EventBus};
pub use delivery::email::{
    sender_from_config, EmailConfig, EmailError, EmailSender, EmailTransport, HttpEmailSender,
    SmtpEmailSender,
};
pub use delivery::template::{render_reminder_email, RenderedEmail};
