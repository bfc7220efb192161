//! Errors raised by object stores and the sample gateway.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// No object is stored under the key.
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything the S3 SDK reports that is not a missing object.
    #[error("S3 error: {0}")]
    S3(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// The key is empty, absolute, or resolves outside the store.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("storage misconfigured: {0}")]
    Config(String),

    /// The caller-supplied byte stream failed before the upload completed.
    #[error("upload source error: {0}")]
    Source(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
