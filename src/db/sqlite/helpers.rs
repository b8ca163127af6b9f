//! Shared helper functions for SQLite repositories.

use sqlx::Arguments;
use sqlx::sqlite::SqliteArguments;

use crate::db::DbError;
use crate::db::projection::Value;

/// Tables joined into one catalog entry.
pub const CATALOG_JOIN: &str = "FROM groups
     JOIN songs ON groups.id = songs.group_id
     JOIN song_details ON songs.id = song_details.song_id";

/// Columns selected for a `CatalogEntry`, aliased for `entry_from_row`.
pub const ENTRY_COLUMNS: &str = "songs.id AS id, groups.name AS group_name, \
     songs.name AS song_name, song_details.release_date AS release_date, \
     song_details.text AS text, song_details.link AS link";

/// Bind projected values positionally, in order.
pub fn to_arguments<'q>(
    op: &'static str,
    values: &[Value],
) -> Result<SqliteArguments<'q>, DbError> {
    let mut args = SqliteArguments::default();
    for value in values {
        let added = match value {
            Value::Text(s) => args.add(s.clone()),
            Value::Date(d) => args.add(d.as_naive()),
        };
        added.map_err(|e| DbError::database(op, format!("failed to bind argument: {}", e)))?;
    }
    Ok(args)
}

/// Append one more positional argument.
pub fn push_argument<'q, T>(
    op: &'static str,
    args: &mut SqliteArguments<'q>,
    value: T,
) -> Result<(), DbError>
where
    T: sqlx::Encode<'q, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + 'q,
{
    args.add(value)
        .map_err(|e| DbError::database(op, format!("failed to bind argument: {}", e)))
}

/// True when the driver reported a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Map a write failure, turning a uniqueness violation into `conflict`.
pub fn conflict_or_database(
    op: &'static str,
    err: sqlx::Error,
    conflict: impl FnOnce() -> DbError,
) -> DbError {
    if is_unique_violation(&err) {
        conflict()
    } else {
        DbError::database(op, err)
    }
}
