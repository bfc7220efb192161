//! User repository.

use crate::error::MetadataResult;
use crate::models::UserRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for user accounts.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()>;

    /// Get a user by ID.
    async fn get_user(&self, user_id: Uuid) -> MetadataResult<Option<UserRow>>;

    /// Get a user by username (exact match).
    async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>>;

    /// Delete a user. Uploaded samples keep their row with the uploader
    /// cleared; saved-sample links and tokens are removed.
    async fn delete_user(&self, user_id: Uuid) -> MetadataResult<()>;
}
