//! Client for the external song-info API.
//!
//! Given a group and a song title, the upstream service answers with the
//! release date, lyrics and a link. One request per lookup, no retries.

use std::future::Future;
use std::time::Duration;

use miette::Diagnostic;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::db::SongDetails;


#[derive(Error, Diagnostic, Debug)]
pub enum EnrichmentError {
    #[error("song info API rejected the request: {message}")]
    #[diagnostic(
        code(music_library::enrichment::bad_request),
        help("The upstream API does not know this group/song combination")
    )]
    BadRequest { message: String },

    #[error("song info API returned status {status}")]
    #[diagnostic(code(music_library::enrichment::upstream))]
    Upstream { status: u16 },

    #[error("failed to decode song info response: {message}")]
    #[diagnostic(code(music_library::enrichment::decode))]
    Decode { message: String },

    #[error("failed to reach song info API")]
    #[diagnostic(
        code(music_library::enrichment::request),
        help("Is the song info API running? Check the API_URL setting.")
    )]
    Request {
        #[source]
        source: reqwest::Error,
    },
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(source: reqwest::Error) -> Self {
        EnrichmentError::Request { source }
    }
}

/// Source of enriched song metadata.
pub trait SongInfoProvider: Send + Sync {
    fn fetch(
        &self,
        group: &str,
        song: &str,
    ) -> impl Future<Output = Result<SongDetails, EnrichmentError>> + Send;
}

/// reqwest-backed provider calling `GET {base_url}/info?group=..&song=..`.
#[derive(Clone)]
pub struct HttpSongInfoProvider {
    base_url: String,
    client: Client,
}

impl HttpSongInfoProvider {
    /// `timeout` bounds the whole request, `idle_timeout` how long pooled
    /// connections are kept open.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(idle_timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SongInfoProvider for HttpSongInfoProvider {
    #[instrument(skip(self))]
    async fn fetch(&self, group: &str, song: &str) -> Result<SongDetails, EnrichmentError> {
        let url = format!("{}/info", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("group", group), ("song", song)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "bad request".to_string());
            warn!(%status, "song info API rejected lookup");
            return Err(EnrichmentError::BadRequest { message });
        }
        if status != StatusCode::OK {
            warn!(%status, "song info API failed");
            return Err(EnrichmentError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let details: SongDetails =
            serde_json::from_slice(&body).map_err(|e| EnrichmentError::Decode {
                message: e.to_string(),
            })?;

        debug!(release_date = %details.release_date, "song info received");
        Ok(details)
    }
}
