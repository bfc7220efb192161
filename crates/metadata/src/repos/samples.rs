//! Sample repository.

use crate::error::MetadataResult;
use crate::models::{NewSample, SampleRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for sample metadata.
#[async_trait]
pub trait SampleRepo: Send + Sync {
    /// List every sample, newest first. There is no pagination.
    async fn list_samples(&self) -> MetadataResult<Vec<SampleRow>>;

    /// Get a sample by ID. Fails with `NotFound` if no row matches.
    async fn get_sample(&self, sample_id: Uuid) -> MetadataResult<SampleRow>;

    /// Insert a sample and return the stored row, including the
    /// server-assigned upload date.
    async fn create_sample(&self, sample: &NewSample) -> MetadataResult<SampleRow>;

    /// Delete a sample. Saved-sample links to it are removed.
    async fn delete_sample(&self, sample_id: Uuid) -> MetadataResult<()>;
}
