//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid musical key: {0}")]
    InvalidMusicalKey(String),

    #[error("invalid tags: {0}")]
    InvalidTags(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("invalid password: {0}")]
    InvalidPassword(String),

    #[error("password credential error: {0}")]
    Credential(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
