#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory `DuckDB` store for typed stop records.
//!
//! A [`StopStore`] owns one in-memory connection for the whole report run.
//! CSV files are loaded with `DuckDB`'s sniffer, which infers a type per
//! column, and every derived subset is a view over its parent relation, so
//! a [`Dataset`] is just a named relation plus a borrow of the store.

pub mod schema;
pub mod store;

pub use schema::{ColumnInfo, ColumnType};
pub use store::{Dataset, StopStore, quote_ident, quote_literal};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// A relation name that does not exist in the store.
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// The CSV produced no columns.
    #[error("CSV at {path} has no columns")]
    EmptyCsv {
        /// File that was loaded.
        path: String,
    },
}
