//! Core domain types and shared logic for the Sample It backend.
//!
//! This crate defines the data model used across all other crates:
//! - Sample and user identifiers
//! - The closed musical key enumeration
//! - Tag payload parsing and file extension derivation
//! - Password credentials and API token material
//! - Service configuration

pub mod config;
pub mod error;
pub mod musical_key;
pub mod sample;
pub mod token;
pub mod user;

pub use error::{Error, Result};
pub use musical_key::{MusicalKey, PITCH_CLASSES};
pub use sample::{SampleId, file_extension, parse_tags};
pub use token::{Token, TokenId, generate_token_secret, hash_token};
pub use user::{PasswordHash, UserId, validate_password, validate_username};

/// Maximum length of a sample display name.
pub const MAX_SAMPLE_NAME_LEN: usize = 255;

/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 50;

/// Maximum length of a stored sample URL.
pub const MAX_SAMPLE_URL_LEN: usize = 500;
