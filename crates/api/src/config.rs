use std::time::Duration;

use segment3d_events::RelayConfig;

use crate::auth::jwt::JwtConfig;

/// Default Google OAuth userinfo endpoint.
pub const DEFAULT_GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Server configuration loaded from environment variables.
///
/// All optional fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long post-shutdown cleanup may wait for background tasks.
    pub shutdown_timeout_secs: u64,
    /// Base URL of the storage service that serves thumbnails.
    pub storage_server_url: String,
    /// AMQP URL of the message broker.
    pub rabbitmq_url: String,
    /// Connections kept open to the broker.
    pub broker_pool_connections: u8,
    /// Shared secret that processing workers present on stage callbacks.
    pub worker_callback_token: String,
    pub google_userinfo_url: String,
    pub outbox: RelayConfig,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `8080`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `10`                       |
    /// | `STORAGE_SERVER_URL`       | **required**               |
    /// | `RABBITMQ_URL`             | **required**               |
    /// | `BROKER_POOL_CONNECTIONS`  | `4`                        |
    /// | `WORKER_CALLBACK_TOKEN`    | **required**               |
    /// | `GOOGLE_USERINFO_URL`      | Google v3 userinfo         |
    /// | `OUTBOX_POLL_INTERVAL_MS`  | `500`                      |
    /// | `OUTBOX_BATCH_SIZE`        | `50`                       |
    ///
    /// # Panics
    ///
    /// Panics on a missing required variable or an unparsable value, so
    /// misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let storage_server_url =
            std::env::var("STORAGE_SERVER_URL").expect("STORAGE_SERVER_URL must be set");

        let rabbitmq_url = std::env::var("RABBITMQ_URL").expect("RABBITMQ_URL must be set");

        let broker_pool_connections: u8 = std::env::var("BROKER_POOL_CONNECTIONS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("BROKER_POOL_CONNECTIONS must be a valid u8");

        let worker_callback_token =
            std::env::var("WORKER_CALLBACK_TOKEN").expect("WORKER_CALLBACK_TOKEN must be set");
        assert!(
            !worker_callback_token.is_empty(),
            "WORKER_CALLBACK_TOKEN must not be empty"
        );

        let google_userinfo_url = std::env::var("GOOGLE_USERINFO_URL")
            .unwrap_or_else(|_| DEFAULT_GOOGLE_USERINFO_URL.into());

        let poll_interval_ms: u64 = std::env::var("OUTBOX_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("OUTBOX_POLL_INTERVAL_MS must be a valid u64");

        let batch_size: i64 = std::env::var("OUTBOX_BATCH_SIZE")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .expect("OUTBOX_BATCH_SIZE must be a valid i64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            storage_server_url,
            rabbitmq_url,
            broker_pool_connections,
            worker_callback_token,
            google_userinfo_url,
            outbox: RelayConfig {
                poll_interval: Duration::from_millis(poll_interval_ms),
                batch_size,
            },
            jwt,
        }
    }
}
