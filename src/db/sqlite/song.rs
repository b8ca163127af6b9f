//! SQLite SongRepository implementation.
//!
//! A catalog entry spans three tables. Multi-statement writes run inside one
//! transaction; returning early drops the transaction, which rolls it back.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, instrument, warn};

use super::helpers::{
    CATALOG_JOIN, ENTRY_COLUMNS, conflict_or_database, push_argument, to_arguments,
};
use crate::db::predicate::{build_set, build_where, placeholder};
use crate::db::projection::{Column, Value, project};
use crate::db::{
    CatalogEntry, DbError, DbResult, NewEntry, PartialEntry, ReleaseDate, SongId, SongRepository,
};

const OP_COUNT: &str = "songs.count";
const OP_LIST: &str = "songs.list";
const OP_GET: &str = "songs.get";
const OP_GET_TEXT: &str = "songs.get_text";
const OP_CREATE: &str = "songs.create";
const OP_PATCH: &str = "songs.patch";
const OP_DELETE: &str = "songs.delete";

// Writers take the write lock up front. A deferred transaction that reads
// first fails with SQLITE_BUSY instead of waiting when two writers overlap.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// SQLx-backed song repository.
pub struct SqliteSongRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

fn entry_from_row(op: &'static str, row: &SqliteRow) -> DbResult<CatalogEntry> {
    let decode = |e: sqlx::Error| DbError::database(op, format!("failed to decode row: {}", e));
    let release_date: NaiveDate = row.try_get("release_date").map_err(decode)?;

    Ok(CatalogEntry {
        id: row.try_get("id").map_err(decode)?,
        group_name: row.try_get("group_name").map_err(decode)?,
        song_name: row.try_get("song_name").map_err(decode)?,
        release_date: ReleaseDate::new(release_date),
        text: row.try_get("text").map_err(decode)?,
        link: row.try_get("link").map_err(decode)?,
    })
}

fn song_not_found(op: &'static str, id: impl ToString) -> DbError {
    DbError::NotFound {
        op,
        entity_type: "song".to_string(),
        id: id.to_string(),
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::Text(s) => s,
        Value::Date(d) => d.to_string(),
    }
}

impl<'a> SongRepository for SqliteSongRepository<'a> {
    #[instrument(skip(self))]
    async fn count(&self, filter: &PartialEntry) -> DbResult<usize> {
        let projection = project(filter);
        let clause = build_where(projection.assignments());
        let sql = format!("SELECT COUNT(*) {} {}", CATALOG_JOIN, clause.where_sql());
        debug!(%sql, "counting songs");

        let args = to_arguments(OP_COUNT, &clause.args)?;
        let total: i64 = sqlx::query_scalar_with(&sql, args)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::database(OP_COUNT, e))?;

        Ok(total as usize)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &PartialEntry,
        page: usize,
        page_size: usize,
    ) -> DbResult<Vec<CatalogEntry>> {
        if page == 0 || page_size == 0 {
            return Err(DbError::InvalidInput {
                op: OP_LIST,
                message: format!(
                    "page and page size must be at least 1 (got page={}, page_size={})",
                    page, page_size
                ),
            });
        }

        let projection = project(filter);
        let clause = build_where(projection.assignments());
        let limit_index = clause.next_index();
        let sql = format!(
            "SELECT {} {} {} ORDER BY songs.id LIMIT {} OFFSET {}",
            ENTRY_COLUMNS,
            CATALOG_JOIN,
            clause.where_sql(),
            placeholder(limit_index),
            placeholder(limit_index + 1),
        );
        debug!(%sql, "listing songs");

        let offset = (page - 1) * page_size;
        let mut args = to_arguments(OP_LIST, &clause.args)?;
        push_argument(OP_LIST, &mut args, page_size as i64)?;
        push_argument(OP_LIST, &mut args, offset as i64)?;

        let rows = sqlx::query_with(&sql, args)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DbError::database(OP_LIST, e))?;

        rows.iter().map(|row| entry_from_row(OP_LIST, row)).collect()
    }

    #[instrument(skip(self))]
    async fn get(&self, id: SongId) -> DbResult<CatalogEntry> {
        let sql = format!(
            "SELECT {} {} WHERE songs.id = ?1",
            ENTRY_COLUMNS, CATALOG_JOIN
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DbError::database(OP_GET, e))?;

        match row {
            Some(row) => entry_from_row(OP_GET, &row),
            None => Err(song_not_found(OP_GET, id)),
        }
    }

    #[instrument(skip(self))]
    async fn get_text(&self, group: &str, song: &str) -> DbResult<String> {
        let text: Option<String> = sqlx::query_scalar(
            "SELECT song_details.text
             FROM songs
             JOIN groups ON groups.id = songs.group_id
             JOIN song_details ON songs.id = song_details.song_id
             WHERE groups.name = ?1 AND songs.name = ?2",
        )
        .bind(group)
        .bind(song)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::database(OP_GET_TEXT, e))?;

        text.ok_or_else(|| song_not_found(OP_GET_TEXT, format!("{} - {}", group, song)))
    }

    #[instrument(skip(self, entry), fields(group = %entry.group_name, song = %entry.song_name))]
    async fn create(&self, entry: &NewEntry) -> DbResult<SongId> {
        if entry.group_name.is_empty() || entry.song_name.is_empty() {
            return Err(DbError::InvalidInput {
                op: OP_CREATE,
                message: "group and song are required".to_string(),
            });
        }

        let mut tx = self
            .pool
            .begin_with(BEGIN_WRITE)
            .await
            .map_err(|e| DbError::database(OP_CREATE, format!("failed to begin: {}", e)))?;

        // No existence pre-check: the UNIQUE constraint decides.
        let group_id: i64 = sqlx::query_scalar("INSERT INTO groups (name) VALUES (?1) RETURNING id")
            .bind(&entry.group_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                conflict_or_database(OP_CREATE, e, || DbError::GroupExists {
                    op: OP_CREATE,
                    name: entry.group_name.clone(),
                })
            })?;

        let song_id: SongId =
            sqlx::query_scalar("INSERT INTO songs (group_id, name) VALUES (?1, ?2) RETURNING id")
                .bind(group_id)
                .bind(&entry.song_name)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    conflict_or_database(OP_CREATE, e, || DbError::SongExists {
                        op: OP_CREATE,
                        name: entry.song_name.clone(),
                    })
                })?;

        sqlx::query(
            "INSERT INTO song_details (song_id, release_date, text, link) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(song_id)
        .bind(entry.details.release_date.as_naive())
        .bind(&entry.details.text)
        .bind(&entry.details.link)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::database(OP_CREATE, format!("failed to insert details: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DbError::database(OP_CREATE, format!("failed to commit: {}", e)))?;

        info!(song_id, "song created");
        Ok(song_id)
    }

    #[instrument(skip(self, changes))]
    async fn patch(&self, id: SongId, changes: &PartialEntry) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin_with(BEGIN_WRITE)
            .await
            .map_err(|e| DbError::database(OP_PATCH, format!("failed to begin: {}", e)))?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM songs WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DbError::database(OP_PATCH, e))?;
        if !exists {
            return Err(song_not_found(OP_PATCH, id));
        }

        let mut projection = project(changes);
        if !projection.cleared().is_empty() {
            warn!(cleared = ?projection.cleared(), "cleared fields are not applied");
        }
        if projection.is_empty() {
            return Err(DbError::InvalidInput {
                op: OP_PATCH,
                message: "no changes".to_string(),
            });
        }
        debug!(columns = ?projection.keys(), "patching song");

        if let Some(group) = projection.take(Column::GroupName) {
            let name = text_of(group);
            sqlx::query(
                "UPDATE groups SET name = ?1 WHERE id = (SELECT group_id FROM songs WHERE id = ?2)",
            )
            .bind(&name)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                conflict_or_database(OP_PATCH, e, || DbError::GroupExists {
                    op: OP_PATCH,
                    name: name.clone(),
                })
            })?;
        }

        if let Some(song) = projection.take(Column::SongName) {
            let name = text_of(song);
            sqlx::query("UPDATE songs SET name = ?1 WHERE id = ?2")
                .bind(&name)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    conflict_or_database(OP_PATCH, e, || DbError::SongExists {
                        op: OP_PATCH,
                        name: name.clone(),
                    })
                })?;
        }

        let set = build_set(projection.assignments(), 1);
        if !set.is_empty() {
            let sql = format!(
                "UPDATE song_details SET {} WHERE song_id = {}",
                set.sql,
                placeholder(set.next_index())
            );
            debug!(%sql, "updating song details");

            let mut args = to_arguments(OP_PATCH, &set.args)?;
            push_argument(OP_PATCH, &mut args, id)?;
            sqlx::query_with(&sql, args)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::database(OP_PATCH, format!("failed to update details: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::database(OP_PATCH, format!("failed to commit: {}", e)))?;

        info!(song_id = id, "song updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: SongId) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin_with(BEGIN_WRITE)
            .await
            .map_err(|e| DbError::database(OP_DELETE, format!("failed to begin: {}", e)))?;

        sqlx::query("DELETE FROM song_details WHERE song_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::database(OP_DELETE, format!("failed to delete details: {}", e)))?;

        let result = sqlx::query("DELETE FROM songs WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::database(OP_DELETE, format!("failed to delete song: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(song_not_found(OP_DELETE, id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::database(OP_DELETE, format!("failed to commit: {}", e)))?;

        info!(song_id = id, "song deleted");
        Ok(())
    }
}
