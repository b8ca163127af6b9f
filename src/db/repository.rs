//! Repository traits for data access abstraction.
//!
//! These traits define the contract for data access, allowing different
//! storage backends to be swapped without changing business logic.
//! Methods return `Send` futures so generic HTTP handlers can await them.

use std::future::Future;

use crate::db::{CatalogEntry, DbResult, NewEntry, PartialEntry, SongId};

/// Repository for catalog entries (group + song + details).
pub trait SongRepository {
    /// Count entries matching every non-empty field of `filter`.
    fn count(&self, filter: &PartialEntry) -> impl Future<Output = DbResult<usize>> + Send;

    /// List one page of matching entries, ordered by song id.
    ///
    /// `page` is 1-based and should already be clamped by the caller.
    fn list(
        &self,
        filter: &PartialEntry,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = DbResult<Vec<CatalogEntry>>> + Send;

    /// Get a single entry by song id.
    fn get(&self, id: SongId) -> impl Future<Output = DbResult<CatalogEntry>> + Send;

    /// Get the lyrics of a song identified by group and song name.
    fn get_text(&self, group: &str, song: &str) -> impl Future<Output = DbResult<String>> + Send;

    /// Atomically insert group, song and details. Returns the new song id.
    fn create(&self, entry: &NewEntry) -> impl Future<Output = DbResult<SongId>> + Send;

    /// Apply the non-empty fields of `changes` to an existing entry.
    fn patch(
        &self,
        id: SongId,
        changes: &PartialEntry,
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Delete a song and its details.
    fn delete(&self, id: SongId) -> impl Future<Output = DbResult<()>> + Send;
}

/// Combined database interface.
pub trait Database: Send + Sync {
    type Songs<'a>: SongRepository + Send + Sync
    where
        Self: 'a;

    /// Run pending migrations.
    fn migrate(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the song repository.
    fn songs(&self) -> Self::Songs<'_>;
}
