//! Core error types for habitflow-core.
//!
//! Ledger and tracker operations report `NotFound` and `InvalidArgument`
//! directly; storage and configuration failures are wrapped in their own
//! enums so callers can tell a bad request from a broken backend.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The referenced entity does not exist (or no longer exists).
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Malformed or out-of-range input. Nothing was written.
    #[error("Invalid value for '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    pub fn habit_not_found(id: impl ToString) -> Self {
        CoreError::NotFound {
            kind: "Habit",
            id: id.to_string(),
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CoreError::InvalidArgument { .. })
    }
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

    /// A stored row could not be decoded back into a model value
    #[error("Corrupt row in '{table}': {message}")]
    CorruptRow { table: &'static str, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The connection mutex was poisoned by a panicking writer
    #[error("Database connection poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/data directory could not be resolved
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
