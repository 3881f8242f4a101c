//! Transactional email delivery.
//!
//! [`EmailSender`] is the seam the dispatch orchestrator sends through: one
//! recipient, one subject, one HTML body. Two transports implement it:
//! [`HttpEmailSender`] posts JSON to a transactional email API, and
//! [`SmtpEmailSender`] wraps the `lettre` async SMTP transport.
//! [`EmailConfig::from_env`] returns `None` when neither is configured, in
//! which case no sender is constructed and email is skipped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// The HTTP request to the email API failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The email API returned a non-2xx status code.
    #[error("Email API returned HTTP {0}")]
    HttpStatus(u16),

    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailSender
// ---------------------------------------------------------------------------

/// Sends one HTML email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError>;
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when neither `EMAIL_FROM` nor `SMTP_FROM` is set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@satprep.local";

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which transport carries outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTransport {
    /// JSON API: `POST {api_url}` with a bearer key.
    Http { api_url: String, api_key: String },
    Smtp {
        host: String,
        port: u16,
        user: Option<String>,
        password: Option<String>,
    },
}

/// Configuration for outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub transport: EmailTransport,
    /// RFC 5322 "From" address.
    pub from_address: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// The HTTP API wins when both `EMAIL_API_URL` and `EMAIL_API_KEY` are
    /// set; otherwise SMTP is used when `SMTP_HOST` is set. Returns `None`
    /// when neither is configured.
    ///
    /// | Variable         | Default                  |
    /// |------------------|--------------------------|
    /// | `EMAIL_API_URL`  | none                     |
    /// | `EMAIL_API_KEY`  | none                     |
    /// | `EMAIL_FROM`     | `SMTP_FROM`, then `noreply@satprep.local` |
    /// | `SMTP_HOST`      | none                     |
    /// | `SMTP_PORT`      | `587`                    |
    /// | `SMTP_USER`      | none                     |
    /// | `SMTP_PASSWORD`  | none                     |
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let transport = match (non_empty("EMAIL_API_URL"), non_empty("EMAIL_API_KEY")) {
            (Some(api_url), Some(api_key)) => EmailTransport::Http { api_url, api_key },
            _ => EmailTransport::Smtp {
                host: non_empty("SMTP_HOST")?,
                port: non_empty("SMTP_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                user: non_empty("SMTP_USER"),
                password: non_empty("SMTP_PASSWORD"),
            },
        };

        let from_address = non_empty("EMAIL_FROM")
            .or_else(|| non_empty("SMTP_FROM"))
            .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string());

        Some(Self {
            transport,
            from_address,
        })
    }
}

/// Build the sender for a configuration.
pub fn sender_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>, EmailError> {
    let sender: Arc<dyn EmailSender> = match &config.transport {
        EmailTransport::Http { api_url, api_key } => Arc::new(HttpEmailSender::new(
            api_url.clone(),
            api_key.clone(),
            config.from_address.clone(),
        )?),
        EmailTransport::Smtp {
            host,
            port,
            user,
            password,
        } => Arc::new(SmtpEmailSender::new(
            host,
            *port,
            user.clone().zip(password.clone()),
            config.from_address.clone(),
        )?),
    };
    Ok(sender)
}

// ---------------------------------------------------------------------------
// HttpEmailSender
// ---------------------------------------------------------------------------

/// Sends through a transactional email HTTP API.
///
/// The request body is `{"from", "to": [..], "subject", "html"}` with
/// `Authorization: Bearer <key>`. Any non-2xx response is an error.
pub struct HttpEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
    ) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let body = serde_json::json!({
            "from": self.from_address,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmailError::HttpStatus(response.status().as_u16()));
        }

        tracing::info!(to, subject, "Reminder email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SmtpEmailSender
// ---------------------------------------------------------------------------

/// Sends through an SMTP relay (STARTTLS).
pub struct SmtpEmailSender {
    mailer: lettre::AsyncSmtpTransport<lettre::Tokio1Executor>,
    from_address: String,
}

impl SmtpEmailSender {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<(String, String)>,
        from_address: String,
    ) -> Result<Self, EmailError> {
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, Tokio1Executor};

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(port);
        if let Some((user, pass)) = credentials {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        use lettre::{message::header::ContentType, AsyncTransport, Message};

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.mailer.send(email).await?;

        tracing::info!(to, subject, "Reminder email sent over SMTP");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
