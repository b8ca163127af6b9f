//! Music library API server binary.
//!
//! This binary creates the concrete database and song info implementations
//! and passes them to the API server. The API layer remains agnostic of both.

use std::time::Duration;

use clap::Parser;
use miette::Diagnostic;
use music_library::api::{self, ApiError, Config, Environment};
use music_library::db::{Database, DbError, SqliteDatabase};
use music_library::enrichment::{EnrichmentError, HttpSongInfoProvider};
use thiserror::Error;
use tracing::info;

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(music_library::binary::database))]
    Database(#[from] DbError),

    #[error("Song info client error: {0}")]
    #[diagnostic(code(music_library::binary::enrichment))]
    Enrichment(#[from] EnrichmentError),

    #[error("API server error: {0}")]
    #[diagnostic(code(music_library::binary::api))]
    Api(#[from] ApiError),
}

#[derive(Parser)]
#[command(name = "music-library-api")]
#[command(author, version, about = "Music library API server", long_about = None)]
struct Cli {
    /// Deployment environment: local, dev or prod [env: ENV]
    #[arg(long)]
    env: Option<Environment>,

    /// SQLite database URL or path [env: DATABASE_URL]
    #[arg(long)]
    database_url: Option<String>,

    /// Address to bind to, host:port [env: HTTP_SERVER_ADDRESS]
    #[arg(short, long)]
    address: Option<String>,

    /// Request timeout in seconds [env: HTTP_SERVER_TIMEOUT]
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Idle timeout of song info connections in seconds [env: HTTP_SERVER_IDLE_TIMEOUT]
    #[arg(long, value_parser = parse_duration)]
    idle_timeout: Option<Duration>,

    /// Base URL of the song info API [env: API_URL]
    #[arg(long)]
    api_url: Option<String>,
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    api::parse_seconds(raw).ok_or_else(|| format!("invalid duration '{}', expected seconds", raw))
}

impl Cli {
    /// Layer CLI flags over the environment-derived config.
    fn into_config(self) -> Config {
        let mut config = Config::new();
        if let Some(env) = self.env {
            config = config.with_env(env);
        }
        if let Some(url) = self.database_url {
            config = config.with_database_url(url);
        }
        if let Some(address) = self.address {
            config = config.with_address(address);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_request_timeout(timeout);
        }
        if let Some(timeout) = self.idle_timeout {
            config = config.with_idle_timeout(timeout);
        }
        if let Some(url) = self.api_url {
            config = config.with_api_url(url);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), BinaryError> {
    // reqwest is built without a bundled crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = Cli::parse().into_config();
    api::init_tracing(config.env);

    info!(url = %config.database_url, "opening database");
    let db = SqliteDatabase::connect(&config.database_url).await?;

    // Run migrations before starting the server
    db.migrate().await?;

    let songs_info =
        HttpSongInfoProvider::new(&config.api_url, config.request_timeout, config.idle_timeout)?;
    info!(api_url = songs_info.base_url(), "song info API configured");

    api::run(config, db, songs_info).await?;

    Ok(())
}
