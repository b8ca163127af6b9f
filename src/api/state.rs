//! Application state for the API server.

use std::sync::Arc;

use crate::db::Database;
use crate::enrichment::SongInfoProvider;

/// Shared application state.
///
/// Generic over the storage backend and the song info source so tests can
/// inject an in-memory database and a canned provider.
pub struct AppState<D: Database, E: SongInfoProvider> {
    db: Arc<D>,
    songs_info: Arc<E>,
}

// Manual Clone impl - only the Arcs are cloned, D and E need not be Clone
impl<D: Database, E: SongInfoProvider> Clone for AppState<D, E> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            songs_info: Arc::clone(&self.songs_info),
        }
    }
}

impl<D: Database, E: SongInfoProvider> AppState<D, E> {
    pub fn new(db: D, songs_info: E) -> Self {
        Self {
            db: Arc::new(db),
            songs_info: Arc::new(songs_info),
        }
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &D {
        &self.db
    }

    /// Get a reference to the song info provider.
    pub fn songs_info(&self) -> &E {
        &self.songs_info
    }
}
