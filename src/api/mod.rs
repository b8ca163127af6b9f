mod handlers;
mod routes;
mod state;
mod v1;


use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use axum::http::StatusCode;
use miette::Diagnostic;
use thiserror::Error;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::enrichment::SongInfoProvider;

pub use routes::create_router;
pub use state::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://music_library.db";
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8002";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind to {address}: {source}")]
    #[diagnostic(
        code(music_library::api::bind),
        help("Is another process already listening on this address?")
    )]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(music_library::api::serve))]
    Serve(#[source] std::io::Error),
}

/// Deployment environment, selects log verbosity and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!(
                "unknown environment '{}' (expected local, dev or prod)",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Local => "local",
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        };
        f.write_str(name)
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub env: Environment,
    /// SQLite URL or file path
    pub database_url: String,
    /// Address to bind to, `host:port`
    pub address: String,
    /// Per-request timeout, also bounds enrichment lookups
    pub request_timeout: Duration,
    /// Idle timeout of pooled enrichment connections
    pub idle_timeout: Duration,
    /// Base URL of the song info API
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Parse a duration given in seconds, with or without an `s` suffix.
pub fn parse_seconds(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let digits = raw.strip_suffix('s').unwrap_or(raw);
    digits.parse::<u64>().ok().map(Duration::from_secs)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// Unparsable values are ignored. Precedence: builder (CLI) > env var >
    /// default.
    pub fn new() -> Self {
        let defaults = Self::default();
        Self {
            env: non_empty_var("ENV")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.env),
            database_url: non_empty_var("DATABASE_URL").unwrap_or(defaults.database_url),
            address: non_empty_var("HTTP_SERVER_ADDRESS").unwrap_or(defaults.address),
            request_timeout: non_empty_var("HTTP_SERVER_TIMEOUT")
                .and_then(|v| parse_seconds(&v))
                .unwrap_or(defaults.request_timeout),
            idle_timeout: non_empty_var("HTTP_SERVER_IDLE_TIMEOUT")
                .and_then(|v| parse_seconds(&v))
                .unwrap_or(defaults.idle_timeout),
            api_url: non_empty_var("API_URL").unwrap_or(defaults.api_url),
        }
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// Default filter directive for an environment.
pub fn default_filter(env: Environment) -> &'static str {
    match env {
        Environment::Local | Environment::Dev => "music_library=debug,tower_http=debug",
        Environment::Prod => "music_library=info,tower_http=info",
    }
}

/// Initialize tracing subscriber with env filter.
///
/// `RUST_LOG` overrides the environment's default filter. Calling this more
/// than once keeps the first subscriber.
pub fn init_tracing(env: Environment) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(env).into());
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match env {
        Environment::Local => registry.with(log_fmt::layer()).try_init(),
        Environment::Dev | Environment::Prod => {
            registry.with(log_fmt::layer().compact()).try_init()
        }
    };
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

/// Run the API server with the given configuration.
///
/// The caller owns database setup (connect and migrate); this only serves.
pub async fn run<D, E>(config: Config, db: D, songs_info: E) -> Result<(), ApiError>
where
    D: Database + 'static,
    E: SongInfoProvider + 'static,
{
    init_tracing(config.env);

    let app = create_router(AppState::new(db, songs_info))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .map_err(|source| ApiError::Bind {
            address: config.address.clone(),
            source,
        })?;
    info!(env = %config.env, "API server listening on http://{}", config.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ApiError::Serve)?;

    info!("API server stopped");
    Ok(())
}
