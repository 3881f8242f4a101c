#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use satprep_api::config::ServerConfig;
use satprep_api::router::build_app_router;
use satprep_api::state::AppState;
use satprep_core::clock::FixedClock;
use satprep_db::{InMemoryStore, ReminderStore};
use satprep_events::{EmailError, EmailSender, EventBus};

pub const TODAY: &str = "2026-03-14";
pub const TOMORROW: &str = "2026-03-15";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        cron_secret: None,
        dispatch_interval_secs: None,
        email_concurrency: 4,
        app_url: "https://app.example.com".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Email fake
// ---------------------------------------------------------------------------

/// An email sent through [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Records every send; can be told to fail and tracks peak concurrency.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(EmailError::HttpStatus(503));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Everything a test needs to drive the app and inspect its effects.
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub email: Arc<RecordingSender>,
    pub event_bus: Arc<EventBus>,
    pub config: ServerConfig,
    email_enabled: bool,
    store_enabled: bool,
}

impl TestHarness {
    /// In-memory store, clock at `TODAY 09:15`, recording email sender.
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            clock: Arc::new(FixedClock::at_str(TODAY, "09:15")),
            email: Arc::new(RecordingSender::default()),
            event_bus: Arc::new(EventBus::default()),
            config: test_config(),
            email_enabled: true,
            store_enabled: true,
        }
    }

    pub fn with_secret(mut self, secret: &str) -> Self {
        self.config.cron_secret = Some(secret.to_string());
        self
    }

    pub fn with_email(mut self, sender: RecordingSender) -> Self {
        self.email = Arc::new(sender);
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.config.email_concurrency = n;
        self
    }

    pub fn without_email(mut self) -> Self {
        self.email_enabled = false;
        self
    }

    pub fn without_store(mut self) -> Self {
        self.store_enabled = false;
        self
    }

    pub fn at(&self, time: &str) {
        self.clock.set(
            chrono::NaiveDateTime::parse_from_str(&format!("{TODAY} {time}"), "%Y-%m-%d %H:%M")
                .unwrap(),
        );
    }

    pub fn state(&self) -> AppState {
        let store: Option<Arc<dyn ReminderStore>> = if self.store_enabled {
            Some(self.store.clone())
        } else {
            None
        };
        let email: Option<Arc<dyn EmailSender>> = if self.email_enabled {
            Some(self.email.clone())
        } else {
            None
        };
        AppState {
            store,
            clock: self.clock.clone(),
            email,
            event_bus: self.event_bus.clone(),
            config: Arc::new(self.config.clone()),
        }
    }

    /// The full application router, same middleware stack as production.
    pub fn app(&self) -> Router {
        build_app_router(self.state(), &self.config)
    }

    pub async fn dispatch(&self) -> Response<Body> {
        post(self.app(), "/api/dispatch_notifications", None).await
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post(app: Router, uri: &str, bearer: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a 200 dispatch body and return `(processed, created, emailed)`.
pub async fn dispatch_counts(response: Response<Body>) -> (u64, u64, u64) {
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    (
        json["processed"].as_u64().unwrap(),
        json["notificationsCreated"].as_u64().unwrap(),
        json["emails_sent"].as_u64().unwrap(),
    )
}
