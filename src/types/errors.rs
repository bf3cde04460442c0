use std::io;
use thiserror::Error;

/// Errors produced while decoding a bus-definition file into a [`Database`](crate::Database).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Not a valid .dbc file: {path}")]
    InvalidExtension { path: String },
    #[error("Failed to open '{path}'. \nError: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed while reading '{path}'. \nError: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Malformed content at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Errors returned by the [`Catalog`](crate::Catalog) registry.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database '{key}' is already loaded")]
    DuplicateKey { key: String },
    #[error("Database '{key}' is not loaded")]
    NotFound { key: String },
    #[error("Failed to load '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: DecodeError,
    },
}

/// Errors returned by projections, the filter/sort engine and the expansion index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("Column {column} is out of range (table has {columns} columns)")]
    InvalidColumn { column: usize, columns: usize },
    #[error("Row {index} is out of range (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("Message not found in the database")]
    UnknownMessage,
    #[error("Signal not found in the message")]
    UnknownSignal,
    #[error("Operation requires the {expected} view, current view is {actual}")]
    WrongMode {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors returned by the [`SessionRegistry`](crate::SessionRegistry).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Explorer session not found")]
    SessionNotFound,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    View(#[from] ViewError),
}
