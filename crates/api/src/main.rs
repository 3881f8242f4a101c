use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use satprep_core::clock::SystemClock;
use satprep_db::{PgReminderStore, ReminderStore};
use satprep_events::{EmailConfig, EventBus};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use satprep_api::background::scheduler;
use satprep_api::config::ServerConfig;
use satprep_api::dispatch::JobContext;
use satprep_api::router::build_app_router;
use satprep_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "satprep_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        cron_secret = config.cron_secret.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    // Without DATABASE_URL the server still starts; job endpoints then
    // answer with a configuration error.
    let store: Option<Arc<dyn ReminderStore>> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = satprep_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            satprep_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Some(Arc::new(PgReminderStore::new(pool)))
        }
        Err(_) => {
            tracing::error!("DATABASE_URL is not set; job endpoints will fail");
            None
        }
    };

    // --- Email ---
    let email = match EmailConfig::from_env() {
        Some(email_config) => {
            let sender = satprep_events::sender_from_config(&email_config)
                .expect("Failed to build email sender");
            tracing::info!(from = %email_config.from_address, "Email delivery enabled");
            Some(sender)
        }
        None => {
            tracing::warn!("No email transport configured; reminder emails disabled");
            None
        }
    };

    // --- App state ---
    let state = AppState {
        store,
        clock: Arc::new(SystemClock),
        email,
        event_bus: Arc::new(EventBus::default()),
        config: Arc::new(config.clone()),
    };

    // --- In-process scheduler ---
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = match (config.dispatch_interval_secs, JobContext::from_state(&state)) {
        (Some(secs), Ok(ctx)) => Some(tokio::spawn(scheduler::run(
            ctx,
            Duration::from_secs(secs),
            scheduler_cancel.clone(),
        ))),
        (Some(_), Err(e)) => {
            tracing::error!(error = %e, "Dispatch scheduler not started");
            None
        }
        (None, _) => None,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scheduler_cancel.cancel();
    if let Some(handle) = scheduler_handle {
        let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
        tracing::info!("Dispatch scheduler stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
