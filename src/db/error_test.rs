//! Tests for database error types.

use crate::db::{DbError, DbResult};

#[test]
fn not_found_error_displays_operation() {
    let err = DbError::NotFound {
        op: "songs.delete",
        entity_type: "song".to_string(),
        id: "7".to_string(),
    };
    assert_eq!(err.to_string(), "songs.delete: song '7' not found");
    assert_eq!(err.op(), Some("songs.delete"));
}

#[test]
fn group_exists_error_displays_correctly() {
    let err = DbError::GroupExists {
        op: "songs.create",
        name: "Muse".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "songs.create: group 'Muse' already exists"
    );
    assert!(err.is_conflict());
}

#[test]
fn song_exists_error_displays_correctly() {
    let err = DbError::SongExists {
        op: "songs.patch",
        name: "Supermassive Black Hole".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "songs.patch: song 'Supermassive Black Hole' already exists"
    );
    assert!(err.is_conflict());
}

#[test]
fn invalid_input_error_displays_correctly() {
    let err = DbError::InvalidInput {
        op: "songs.patch",
        message: "no changes".to_string(),
    };
    assert_eq!(err.to_string(), "songs.patch: invalid input: no changes");
    assert!(!err.is_conflict());
}

#[test]
fn database_helper_wraps_message() {
    let err = DbError::database("songs.count", "disk I/O error");
    assert_eq!(err.to_string(), "songs.count: database error: disk I/O error");
    assert_eq!(err.op(), Some("songs.count"));
}

#[test]
fn connection_and_migration_errors_have_no_operation() {
    let conn = DbError::Connection {
        message: "unable to open database".to_string(),
    };
    assert_eq!(conn.to_string(), "Connection error: unable to open database");
    assert_eq!(conn.op(), None);

    let migration = DbError::Migration {
        message: "failed to apply migration 20250101000000".to_string(),
    };
    assert_eq!(
        migration.to_string(),
        "Migration error: failed to apply migration 20250101000000"
    );
    assert_eq!(migration.op(), None);
}

#[test]
fn db_result_err_returns_error() {
    let result: DbResult<i32> = Err(DbError::NotFound {
        op: "songs.get",
        entity_type: "song".to_string(),
        id: "12".to_string(),
    });
    assert!(result.is_err());
}
