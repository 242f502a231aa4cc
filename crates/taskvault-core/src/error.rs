//! Core error types for taskvault-core.
//!
//! This module defines the error hierarchy using thiserror. Storage
//! failures, validation failures, and missing rows are kept as distinct
//! variants so callers can react to each without string matching.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskvault-core.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested row does not exist. Lookups never return a
    /// zero-valued entity in place of a missing one.
    #[error("no {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Malformed input rejected before it reaches storage
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO errors (data directory creation)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Entity name is empty or whitespace
    #[error("{entity} name must not be empty")]
    EmptyName { entity: &'static str },

    /// Repeat interval below zero (zero itself is coerced to one)
    #[error("repeat interval must not be negative (got {0})")]
    NegativeRepeatInterval(i64),

    /// A gate flag is set but its timestamp is missing or not a valid instant
    #[error("'{field}' must be a positive instant when '{gate}' is set (got {value})")]
    MissingTimestamp {
        gate: &'static str,
        field: &'static str,
        value: i64,
    },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for StoreError
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
