//! User identity and password credentials.

use argon2::password_hash::{PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum username length.
pub const MAX_USERNAME_LEN: usize = 50;

/// Maximum password length.
pub const MAX_PASSWORD_LEN: usize = 255;

const SALT_LEN: usize = 16;

/// Unique identifier for a user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::Error::InvalidId(format!("invalid user ID: {e}")))
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a username: non-empty, at most 50 characters, no surrounding
/// whitespace or control characters.
pub fn validate_username(username: &str) -> crate::Result<()> {
    if username.is_empty() {
        return Err(crate::Error::InvalidUsername(
            "username cannot be empty".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(crate::Error::InvalidUsername(format!(
            "username exceeds {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.trim() != username {
        return Err(crate::Error::InvalidUsername(
            "username cannot start or end with whitespace".to_string(),
        ));
    }
    if username.chars().any(char::is_control) {
        return Err(crate::Error::InvalidUsername(
            "username cannot contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate a plaintext password before hashing.
pub fn validate_password(password: &str) -> crate::Result<()> {
    if password.is_empty() {
        return Err(crate::Error::InvalidPassword(
            "password cannot be empty".to_string(),
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(crate::Error::InvalidPassword(format!(
            "password exceeds {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// A stored password credential: an Argon2id hash in PHC string form
/// (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a password with a fresh random salt and the default Argon2id
    /// parameters.
    pub fn create(password: &str) -> crate::Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| crate::Error::Credential(format!("salt encoding failed: {e}")))?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| crate::Error::Credential(format!("password hashing failed: {e}")))?;
        Ok(Self(phc.to_string()))
    }

    /// Parse a stored credential string. Only Argon2id hashes are accepted.
    pub fn parse(encoded: &str) -> crate::Result<Self> {
        let phc = PhcString::new(encoded)
            .map_err(|e| crate::Error::Credential(format!("malformed password hash: {e}")))?;
        if phc.algorithm != Algorithm::Argon2id.ident() {
            return Err(crate::Error::Credential(format!(
                "unsupported password hash algorithm: {}",
                phc.algorithm
            )));
        }
        if phc.hash.is_none() {
            return Err(crate::Error::Credential(
                "password hash carries no output".to_string(),
            ));
        }
        Ok(Self(encoded.to_string()))
    }

    /// Check a plaintext password against this credential. The comparison is
    /// constant-time.
    pub fn verify(&self, password: &str) -> bool {
        PhcString::new(&self.0)
            .and_then(|phc| Argon2::default().verify_password(password.as_bytes(), &phc))
            .is_ok()
    }

    /// Encode for storage.
    pub fn encode(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_roundtrip() {
        let id = UserId::new();
        let parsed = UserId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("beatmaker").is_ok());
        assert!(validate_username(&"a".repeat(50)).is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(51)).is_err());
        assert!(validate_username(" padded").is_err());
        assert!(validate_username("tab\there").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("hunter2").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(256)).is_err());
    }

    #[test]
    fn test_password_hash_verify() {
        let hash = PasswordHash::create("correct horse").unwrap();
        assert!(hash.verify("correct horse"));
        assert!(!hash.verify("correct horse "));
        assert!(!hash.verify(""));
    }

    #[test]
    fn test_password_hash_encode_parse() {
        let hash = PasswordHash::create("s3cret").unwrap();
        let encoded = hash.encode();
        assert!(encoded.starts_with("$argon2id$v=19$"));

        let parsed = PasswordHash::parse(&encoded).unwrap();
        assert_eq!(parsed, hash);
        assert!(parsed.verify("s3cret"));
        assert!(!parsed.verify("S3cret"));
    }

    #[test]
    fn test_password_hash_salted() {
        let a = PasswordHash::create("same").unwrap();
        let b = PasswordHash::create("same").unwrap();
        assert_ne!(a.encode(), b.encode());
        assert!(b.verify("same"));
    }

    #[test]
    fn test_password_hash_parse_rejects_garbage() {
        assert!(PasswordHash::parse("plaintext").is_err());
        assert!(PasswordHash::parse("sha256$10000$c2FsdA$00").is_err());
        assert!(PasswordHash::parse("$argon2i$v=19$m=4096,t=3,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA").is_err());
        assert!(PasswordHash::parse("$argon2id$v=19$m=4096,t=3,p=1$c2FsdHNhbHQ").is_err());
    }

    #[test]
    fn test_password_hash_debug_hides_hash() {
        let hash = PasswordHash::create("hidden").unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(..)");
    }
}
