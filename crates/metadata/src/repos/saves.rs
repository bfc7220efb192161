//! Saved-sample repository.

use crate::error::MetadataResult;
use crate::models::SavedSampleRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for user bookmarks of samples.
#[async_trait]
pub trait SavedSampleRepo: Send + Sync {
    /// List all saves for a user, oldest first.
    async fn list_saved_samples(&self, user_id: Uuid) -> MetadataResult<Vec<SavedSampleRow>>;

    /// Save a sample for a user.
    ///
    /// Fails with `Conflict` if the pair is already saved, and with
    /// `NotFound` if either the user or the sample does not exist.
    async fn save_sample(&self, user_id: Uuid, sample_id: Uuid) -> MetadataResult<SavedSampleRow>;
}
