//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Map constraint violations on insert to domain errors.
///
/// Unique and primary-key violations become [`MetadataError::Conflict`];
/// foreign-key violations become [`MetadataError::NotFound`], since they mean
/// a referenced row is absent. Anything else stays a database error.
pub(crate) fn map_insert_error(err: sqlx::Error, what: impl FnOnce() -> String) -> MetadataError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return MetadataError::Conflict(what());
        }
        if db_err.is_foreign_key_violation() {
            return MetadataError::NotFound(format!("referenced row missing for {}", what()));
        }
    }
    MetadataError::Database(err)
}
