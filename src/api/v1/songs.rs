//! Song catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::api::AppState;
use crate::db::pagination::{PageRequest, RowPage, paginate_rows, paginate_verses};
use crate::db::{
    CatalogEntry, Database, DbError, Field, NewEntry, PartialEntry, ReleaseDate, SongId,
    SongRepository,
};
use crate::enrichment::{EnrichmentError, SongInfoProvider};

type HandlerError = (StatusCode, Json<ErrorResponse>);

// =============================================================================
// DTOs (Data Transfer Objects)
// =============================================================================

/// Song response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SongResponse {
    #[schema(example = 1)]
    pub id: SongId,
    #[schema(example = "Muse")]
    pub group: String,
    #[schema(example = "Supermassive Black Hole")]
    pub song: String,
    /// Release date, `DD.MM.YYYY`
    #[schema(example = "16.07.2006")]
    pub release_date: String,
    #[schema(example = "Ooh baby, don't you know I suffer?\n\nOoh baby, can you hear me moan?")]
    pub text: String,
    #[schema(example = "https://www.youtube.com/watch?v=Xsp3_a-PMTw")]
    pub link: String,
}

impl From<CatalogEntry> for SongResponse {
    fn from(e: CatalogEntry) -> Self {
        Self {
            id: e.id,
            group: e.group_name,
            song: e.song_name,
            release_date: e.release_date.to_string(),
            text: e.text,
            link: e.link,
        }
    }
}

/// Create song request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSongRequest {
    #[schema(example = "Muse")]
    #[serde(default)]
    pub group: String,
    #[schema(example = "Supermassive Black Hole")]
    #[serde(default)]
    pub song: String,
}

/// Patch song request DTO
///
/// Omitted fields are left untouched. `group` and `song` cannot be cleared.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchSongRequest {
    #[schema(value_type = Option<String>, example = "Muse")]
    #[serde(default, deserialize_with = "crate::serde_utils::tri_state")]
    pub group: Field<String>,
    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "crate::serde_utils::tri_state")]
    pub song: Field<String>,
    #[schema(value_type = Option<String>, example = "16.07.2006")]
    #[serde(default, deserialize_with = "crate::serde_utils::tri_state")]
    pub release_date: Field<ReleaseDate>,
    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "crate::serde_utils::tri_state")]
    pub text: Field<String>,
    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "crate::serde_utils::tri_state")]
    pub link: Field<String>,
}

impl From<PatchSongRequest> for PartialEntry {
    fn from(req: PatchSongRequest) -> Self {
        Self {
            group: req.group,
            song: req.song,
            release_date: req.release_date,
            text: req.text,
            link: req.link,
        }
    }
}

/// Error response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    #[schema(example = "songs.get: song '7' not found")]
    pub error: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListSongsQuery {
    /// Exact group name
    #[param(example = "Imagine Dragons")]
    pub group: Option<String>,
    /// Exact song name
    pub song: Option<String>,
    /// Exact release date, `DD.MM.YYYY`
    #[param(example = "16.07.2006")]
    pub release_date: Option<String>,
    /// Exact lyrics
    pub text: Option<String>,
    /// Exact link
    pub link: Option<String>,
    /// Page number, 1-based (default 1)
    #[param(example = 1)]
    pub page: Option<String>,
    /// Songs per page (default 10)
    #[param(example = 10)]
    pub page_size: Option<String>,
}

impl ListSongsQuery {
    /// Empty parameters do not filter.
    fn filter(&self) -> Result<PartialEntry, String> {
        let text = |raw: &Option<String>| {
            raw.as_deref()
                .map(Field::<String>::text)
                .unwrap_or_default()
        };
        let release_date = match self.release_date.as_deref().map(str::trim) {
            None | Some("") => Field::Absent,
            Some(raw) => Field::Value(raw.parse::<ReleaseDate>()?),
        };

        Ok(PartialEntry {
            group: text(&self.group),
            song: text(&self.song),
            release_date,
            text: text(&self.text),
            link: text(&self.link),
        })
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::from_params(self.page.as_deref(), self.page_size.as_deref())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedSongs {
    pub songs: Vec<SongResponse>,
    pub max_page_size: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub total_songs: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SongTextQuery {
    /// Group name (required)
    #[param(example = "Muse")]
    pub group: Option<String>,
    /// Song name (required)
    #[param(example = "Supermassive Black Hole")]
    pub song: Option<String>,
    /// Page number, 1-based (default 1)
    pub page: Option<String>,
    /// Verses per page (default 10)
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedVerses {
    pub verses: Vec<String>,
    pub max_verses_per_page: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// List songs
///
/// Returns songs matching every supplied filter, one page at a time
#[utoipa::path(
    get,
    path = "/api/v1/songs",
    tag = "songs",
    params(ListSongsQuery),
    responses(
        (status = 200, description = "Paginated list of songs", body = PaginatedSongs),
        (status = 400, description = "Malformed filter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_songs<D: Database, E: SongInfoProvider>(
    State(state): State<AppState<D, E>>,
    Query(query): Query<ListSongsQuery>,
) -> Result<Json<PaginatedSongs>, HandlerError> {
    let filter = query.filter().map_err(bad_request)?;
    let songs = state.db().songs();

    let total = songs.count(&filter).await.map_err(db_error)?;
    let window = match paginate_rows(total, query.page_request()) {
        RowPage::Empty { page_size } => {
            return Ok(Json(PaginatedSongs {
                songs: Vec::new(),
                max_page_size: page_size,
                total_pages: 0,
                current_page: 0,
                total_songs: 0,
            }));
        }
        RowPage::Window(window) => window,
    };

    let items = songs
        .list(&filter, window.page, window.page_size)
        .await
        .map_err(db_error)?;

    Ok(Json(PaginatedSongs {
        songs: items.into_iter().map(SongResponse::from).collect(),
        max_page_size: window.page_size,
        total_pages: window.total_pages,
        current_page: window.page,
        total_songs: window.total_count,
    }))
}

/// Get song lyrics
///
/// Returns the verses of one song, paginated
#[utoipa::path(
    get,
    path = "/api/v1/songs/text",
    tag = "songs",
    params(SongTextQuery),
    responses(
        (status = 200, description = "Page of verses", body = PaginatedVerses),
        (status = 400, description = "Group or song missing", body = ErrorResponse),
        (status = 404, description = "Song not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_song_text<D: Database, E: SongInfoProvider>(
    State(state): State<AppState<D, E>>,
    Query(query): Query<SongTextQuery>,
) -> Result<Json<PaginatedVerses>, HandlerError> {
    let group = required(query.group.as_deref(), "group")?;
    let song = required(query.song.as_deref(), "song")?;

    let text = state
        .db()
        .songs()
        .get_text(group, song)
        .await
        .map_err(db_error)?;

    let request = PageRequest::from_params(query.page.as_deref(), query.page_size.as_deref());
    let page = paginate_verses(&text, request);

    Ok(Json(PaginatedVerses {
        verses: page.verses,
        max_verses_per_page: page.page_size,
        total_pages: page.total_pages,
        current_page: page.page,
    }))
}

/// Get a song by ID
#[utoipa::path(
    get,
    path = "/api/v1/songs/{id}",
    tag = "songs",
    params(("id" = i64, Path, description = "Song ID")),
    responses(
        (status = 200, description = "Song found", body = SongResponse),
        (status = 404, description = "Song not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_song<D: Database, E: SongInfoProvider>(
    State(state): State<AppState<D, E>>,
    Path(id): Path<SongId>,
) -> Result<Json<SongResponse>, HandlerError> {
    let entry = state.db().songs().get(id).await.map_err(db_error)?;
    Ok(Json(SongResponse::from(entry)))
}

/// Add a song
///
/// Looks up release date, lyrics and link from the song info API, then stores
/// the complete entry
#[utoipa::path(
    post,
    path = "/api/v1/songs",
    tag = "songs",
    request_body = CreateSongRequest,
    responses(
        (status = 201, description = "Song created", body = SongResponse),
        (status = 400, description = "Invalid request or unknown to song info API", body = ErrorResponse),
        (status = 409, description = "Group or song already exists", body = ErrorResponse),
        (status = 502, description = "Song info API failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_song<D: Database, E: SongInfoProvider>(
    State(state): State<AppState<D, E>>,
    Json(req): Json<CreateSongRequest>,
) -> Result<(StatusCode, Json<SongResponse>), HandlerError> {
    let group = required(Some(req.group.as_str()), "group")?;
    let song = required(Some(req.song.as_str()), "song")?;

    let details = state
        .songs_info()
        .fetch(group, song)
        .await
        .map_err(enrichment_error)?;

    let entry = NewEntry {
        group_name: group.to_string(),
        song_name: song.to_string(),
        details,
    };

    let songs = state.db().songs();
    let id = songs.create(&entry).await.map_err(db_error)?;
    let created = songs.get(id).await.map_err(db_error)?;

    info!(id, "song added");
    Ok((StatusCode::CREATED, Json(SongResponse::from(created))))
}

/// Update a song
///
/// Changes only the supplied fields
#[utoipa::path(
    patch,
    path = "/api/v1/songs/{id}",
    tag = "songs",
    params(("id" = i64, Path, description = "Song ID")),
    request_body = PatchSongRequest,
    responses(
        (status = 200, description = "Song updated", body = SongResponse),
        (status = 400, description = "No changes or cleared group/song", body = ErrorResponse),
        (status = 404, description = "Song not found", body = ErrorResponse),
        (status = 409, description = "Group or song name taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn patch_song<D: Database, E: SongInfoProvider>(
    State(state): State<AppState<D, E>>,
    Path(id): Path<SongId>,
    Json(req): Json<PatchSongRequest>,
) -> Result<Json<SongResponse>, HandlerError> {
    if req.group.is_cleared() || req.song.is_cleared() {
        return Err(bad_request("group and song cannot be cleared"));
    }

    let changes = PartialEntry::from(req);
    let songs = state.db().songs();
    songs.patch(id, &changes).await.map_err(db_error)?;
    let updated = songs.get(id).await.map_err(db_error)?;

    Ok(Json(SongResponse::from(updated)))
}

/// Delete a song
///
/// The owning group is kept
#[utoipa::path(
    delete,
    path = "/api/v1/songs/{id}",
    tag = "songs",
    params(("id" = i64, Path, description = "Song ID")),
    responses(
        (status = 204, description = "Song deleted"),
        (status = 404, description = "Song not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_song<D: Database, E: SongInfoProvider>(
    State(state): State<AppState<D, E>>,
    Path(id): Path<SongId>,
) -> Result<StatusCode, HandlerError> {
    state.db().songs().delete(id).await.map_err(db_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn error_body(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> HandlerError {
    let message = message.into();
    warn!(%message, "rejected request");
    error_body(StatusCode::BAD_REQUEST, message)
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, HandlerError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(bad_request(format!("{} is required", name))),
    }
}

fn db_error(e: DbError) -> HandlerError {
    let status = match &e {
        e if e.is_conflict() => StatusCode::CONFLICT,
        DbError::NotFound { .. } => StatusCode::NOT_FOUND,
        DbError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(op = e.op(), error = %e, "storage failure");
    } else {
        warn!(op = e.op(), error = %e, "request failed");
    }
    error_body(status, e.to_string())
}

fn enrichment_error(e: EnrichmentError) -> HandlerError {
    let status = match &e {
        EnrichmentError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        EnrichmentError::Upstream { .. }
        | EnrichmentError::Decode { .. }
        | EnrichmentError::Request { .. } => StatusCode::BAD_GATEWAY,
    };
    error!(error = %e, "song info lookup failed");
    error_body(status, e.to_string())
}
