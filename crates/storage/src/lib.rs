//! Object storage for uploaded samples.
//!
//! This crate provides:
//! - The [`ObjectStore`] abstraction with streaming uploads
//! - Backends: local filesystem and S3-compatible
//! - [`SampleStorage`], the gateway that turns an upload stream into a
//!   stored object and a public URL

pub mod backends;
pub mod error;
pub mod gateway;
pub mod traits;

pub use backends::{
    filesystem::{FilesystemBackend, LOCAL_FILES_ROUTE},
    s3::{S3Backend, S3Settings},
};
pub use error::{StorageError, StorageResult};
pub use gateway::{SAMPLE_KEY_PREFIX, SampleStorage, StoredObject};
pub use traits::{ByteStream, ObjectMeta, ObjectStore, StreamingUpload};

use sampleit_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path, public_url } => {
            let backend = FilesystemBackend::new(path)
                .await?
                .with_public_url(public_url.clone());
            Ok(Arc::new(backend))
        }
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
            public_url,
        } => {
            let backend = S3Backend::new(S3Settings {
                bucket: bucket.clone(),
                endpoint: endpoint.clone(),
                region: region.clone(),
                prefix: prefix.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                force_path_style: *force_path_style,
                public_url: public_url.clone(),
            })
            .await?;
            Ok(Arc::new(backend))
        }
    }
}
