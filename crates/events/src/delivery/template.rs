//! HTML rendering for reminder emails.

use satprep_core::reminder::NotificationPayload;

/// A ready-to-send email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Render the email for one persisted reminder.
///
/// `message` is the plain notification text; `app_url` is the public base
/// URL the call-to-action links into.
pub fn render_reminder_email(
    payload: &NotificationPayload,
    message: &str,
    app_url: &str,
) -> RenderedEmail {
    let link = action_link(payload, app_url.trim_end_matches('/'));
    let label = action_label(payload);

    let html = format!(
        "<!DOCTYPE html>\
<html><body style=\"font-family:sans-serif;color:#1f2937\">\
<h2 style=\"margin:0 0 12px\">SAT Prep</h2>\
<p>{message}</p>\
<p><a href=\"{link}\" style=\"display:inline-block;padding:10px 16px;background:#2563eb;color:#fff;border-radius:6px;text-decoration:none\">{label}</a></p>\
<p style=\"font-size:12px;color:#6b7280\">You are receiving this because you have not opened the app since this reminder was created.</p>\
</body></html>",
        message = escape_html(message),
        link = escape_html(&link),
    );

    RenderedEmail {
        subject: payload.email_subject().to_string(),
        html,
    }
}

fn action_link(payload: &NotificationPayload, base: &str) -> String {
    match payload {
        NotificationPayload::PlanStart { plan_id, .. } => format!("{base}/study-room/{plan_id}"),
        NotificationPayload::PlanMissed { .. } => format!("{base}/log"),
        NotificationPayload::TomorrowReminder => format!("{base}/plan"),
        NotificationPayload::PremiumExpired | NotificationPayload::PremiumExpiring { .. } => {
            format!("{base}/premium")
        }
    }
}

fn action_label(payload: &NotificationPayload) -> &'static str {
    match payload {
        NotificationPayload::PlanStart { .. } => "Open study room",
        NotificationPayload::PlanMissed { .. } => "Check in now",
        NotificationPayload::TomorrowReminder => "Plan tomorrow",
        NotificationPayload::PremiumExpired | NotificationPayload::PremiumExpiring { .. } => {
            "Manage subscription"
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
