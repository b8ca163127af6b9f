//! Database error types.
//!
//! This module provides the error taxonomy for catalog operations.
//! It uses miette for fancy diagnostic output and thiserror for derive macros.
//! Errors raised by repository operations carry the operation name (`op`)
//! so a failure can be traced back to the call that produced it.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("{op}: {entity_type} '{id}' not found")]
    #[diagnostic(code(music_library::db::not_found))]
    NotFound {
        op: &'static str,
        entity_type: String,
        id: String,
    },

    #[error("{op}: group '{name}' already exists")]
    #[diagnostic(
        code(music_library::db::group_exists),
        help("Group names are unique across the whole catalog")
    )]
    GroupExists { op: &'static str, name: String },

    #[error("{op}: song '{name}' already exists")]
    #[diagnostic(
        code(music_library::db::song_exists),
        help("Song names are unique across the whole catalog, not per group")
    )]
    SongExists { op: &'static str, name: String },

    #[error("{op}: invalid input: {message}")]
    #[diagnostic(code(music_library::db::invalid_input))]
    InvalidInput { op: &'static str, message: String },

    #[error("{op}: database error: {message}")]
    #[diagnostic(code(music_library::db::database_error))]
    Database { op: &'static str, message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(music_library::db::connection_error))]
    Connection { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(music_library::db::migration_error))]
    Migration { message: String },
}

impl DbError {
    /// Build a `Database` error from any driver failure.
    pub fn database(op: &'static str, err: impl std::fmt::Display) -> Self {
        DbError::Database {
            op,
            message: err.to_string(),
        }
    }

    /// The operation that raised this error, if it came from a repository call.
    pub fn op(&self) -> Option<&'static str> {
        match self {
            DbError::NotFound { op, .. }
            | DbError::GroupExists { op, .. }
            | DbError::SongExists { op, .. }
            | DbError::InvalidInput { op, .. }
            | DbError::Database { op, .. } => Some(op),
            DbError::Connection { .. } | DbError::Migration { .. } => None,
        }
    }

    /// True for uniqueness conflicts on group or song names.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::GroupExists { .. } | DbError::SongExists { .. })
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
