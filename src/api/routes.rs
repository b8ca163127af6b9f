//! API route configuration.

use axum::Router;
use axum::routing::{delete, get, patch, post};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use super::handlers::{self, HealthResponse};
use super::state::AppState;
use super::v1::{
    self, CreateSongRequest, ErrorResponse, PaginatedSongs, PaginatedVerses, PatchSongRequest,
    SongResponse,
};
use crate::db::Database;
use crate::enrichment::SongInfoProvider;

/// Build routes with generic database and song info types.
///
/// This macro reduces boilerplate when registering handlers that are generic
/// over the Database and SongInfoProvider traits. It applies the turbofish
/// operator automatically.
macro_rules! routes {
    ($D:ty, $E:ty => {
        $($method:ident $path:literal => $($handler:ident)::+),* $(,)?
    }) => {{
        let router = Router::new();
        $(
            let router = router.route($path, $method($($handler)::+::<$D, $E>));
        )*
        router
    }};
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Music Library API",
        version = "0.1.0",
        description = "Song catalog: groups, songs, release dates and lyrics",
        license(name = "GPL-2.0")
    ),
    paths(
        handlers::root,
        handlers::health,
        v1::list_songs,
        v1::get_song_text,
        v1::get_song,
        v1::create_song,
        v1::patch_song,
        v1::delete_song,
    ),
    components(
        schemas(
            HealthResponse,
            SongResponse,
            PaginatedSongs,
            PaginatedVerses,
            CreateSongRequest,
            PatchSongRequest,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "songs", description = "Song catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the API router with OpenAPI documentation
pub fn create_router<D, E>(state: AppState<D, E>) -> Router
where
    D: Database + 'static,
    E: SongInfoProvider + 'static,
{
    let api = ApiDoc::openapi();

    // System routes (non-generic)
    let system_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health));

    // Song routes (generic over Database and SongInfoProvider)
    let song_routes = routes!(D, E => {
        get "/api/v1/songs" => v1::list_songs,
        post "/api/v1/songs" => v1::create_song,
        get "/api/v1/songs/text" => v1::get_song_text,
        get "/api/v1/songs/{id}" => v1::get_song,
        patch "/api/v1/songs/{id}" => v1::patch_song,
        delete "/api/v1/songs/{id}" => v1::delete_song,
    });

    system_routes
        .merge(song_routes)
        .merge(Scalar::with_url("/docs", api))
        .with_state(state)
}
