use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pakotp_api::auth::validator::TokenValidator;
use pakotp_api::config::ServerConfig;
use pakotp_api::notifications::{EmailConfig, NoopNotifier, Notifier, SmtpNotifier};
use pakotp_api::rate_limit::InMemoryRateLimiter;
use pakotp_api::router::build_app_router;
use pakotp_api::state::AppState;
use pakotp_api::background;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pakotp_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = pakotp_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    pakotp_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    pakotp_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Email notifier ---
    let notifier: Arc<dyn Notifier> = match EmailConfig::from_env() {
        Some(email_config) => {
            let smtp = SmtpNotifier::new(&email_config).expect("Failed to build SMTP notifier");
            tracing::info!(host = %email_config.smtp_host, "SMTP notifier configured");
            Arc::new(smtp)
        }
        None => {
            tracing::warn!("SMTP_HOST not set; outbound email is disabled");
            Arc::new(NoopNotifier)
        }
    };

    // --- Rate limiter ---
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(
        config.rate_limit_max_attempts,
        chrono::Duration::seconds(config.rate_limit_window_secs),
    ));

    // --- Token validator ---
    let validator = Arc::new(TokenValidator::new(config.expiry));

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        validator,
        notifier,
        rate_limiter,
    };

    // --- Background sweeps ---
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let retention_handle = tokio::spawn(background::session_retention::run(
        pool.clone(),
        config.session_retention_days,
        sweep_cancel.clone(),
    ));
    let cleanup_handle = tokio::spawn(background::unverified_accounts::run(
        pool.clone(),
        config.registration_ttl_mins,
        sweep_cancel.clone(),
    ));
    tracing::info!("Background sweeps started (session retention, unverified accounts)");

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

    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Background sweeps stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
