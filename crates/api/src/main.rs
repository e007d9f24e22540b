use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use segment3d_events::{BrokerPublisher, OutboxRelay, PgOutboxStore};
use segment3d_pipeline::{AssetLifecycle, HttpThumbnailSource, PgAssetStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segment3d_api::auth::google::HttpGoogleIdentity;
use segment3d_api::config::ServerConfig;
use segment3d_api::router::build_app_router;
use segment3d_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "segment3d_api=debug,segment3d_pipeline=debug,segment3d_events=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = segment3d_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    segment3d_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    segment3d_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Broker + outbox relay ---
    let publisher = BrokerPublisher::connect(&config.rabbitmq_url, config.broker_pool_connections)
        .await
        .expect("Failed to connect to message broker");
    tracing::info!("Message broker connected");

    let relay = OutboxRelay::new(
        Arc::new(PgOutboxStore::new(pool.clone())),
        Arc::new(publisher),
        config.outbox,
    );
    let relay_cancel = CancellationToken::new();
    let relay_cancel_clone = relay_cancel.clone();
    let relay_handle = tokio::spawn(async move {
        relay.run(relay_cancel_clone).await;
    });
    tracing::info!(
        poll_interval_ms = config.outbox.poll_interval.as_millis() as u64,
        batch_size = config.outbox.batch_size,
        "Outbox relay started"
    );

    // --- Lifecycle + collaborators ---
    let thumbnails = HttpThumbnailSource::new(config.storage_server_url.clone())
        .expect("Failed to build storage service client");
    let lifecycle = AssetLifecycle::new(
        Arc::new(PgAssetStore::new(pool.clone())),
        Arc::new(thumbnails),
    );
    let google = HttpGoogleIdentity::new(config.google_userinfo_url.clone())
        .expect("Failed to build Google userinfo client");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        lifecycle: Arc::new(lifecycle),
        google: Arc::new(google),
    };

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

    // Pending outbox rows stay in the table and go out on the next start.
    relay_cancel.cancel();
    let _ = tokio::time::timeout(
        Duration::from_secs(config.shutdown_timeout_secs),
        relay_handle,
    )
    .await;
    tracing::info!("Outbox relay stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
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
