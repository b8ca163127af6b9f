//! Catalog data-access layer.
//!
//! This module provides trait-based abstractions for data access,
//! allowing different storage backends to be swapped without changing
//! business logic.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Domain entities (CatalogEntry, NewEntry, PartialEntry)
//! - `projection`: Flattening of sparse entries into storage columns
//! - `predicate`: Parameterized WHERE/SET clause construction
//! - `pagination`: Row and verse page arithmetic
//! - `repository`: Trait definitions for data access
//! - `sqlite`: SQLx/SQLite implementation

mod error;
mod models;
pub mod pagination;
pub mod predicate;
pub mod projection;
mod repository;
pub mod sqlite;

#[cfg(test)]
mod error_test;

pub use error::{DbError, DbResult};
pub use models::*;
pub use repository::*;
pub use sqlite::SqliteDatabase;
