//! The object store abstraction behind the sample gateway.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Object contents as a stream of chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// A flat key/value blob store holding sample audio.
///
/// Keys are `/`-separated relative paths such as `samples/{uuid}-kick.wav`.
/// Implementations must reject keys that escape their namespace with
/// [`StorageError::InvalidKey`](crate::StorageError::InvalidKey).
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Size and timestamps of an object, or `NotFound`.
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Read an object chunk by chunk.
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Begin a streaming write. Nothing is visible under `key` until
    /// [`StreamingUpload::finish`] succeeds.
    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>>;

    /// Remove an object. Removing a key that holds nothing succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Keys under `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Short backend identifier for logs and metrics ("filesystem", "s3").
    fn backend_name(&self) -> &'static str;

    /// Public URL for an object key.
    ///
    /// Derived from configuration only; the object need not exist.
    fn object_url(&self, key: &str) -> String;

    /// Probe connectivity at startup. Backends without a remote end keep the
    /// default.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Facts about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    pub size: u64,
    pub last_modified: Option<time::OffsetDateTime>,
    pub content_type: Option<String>,
}

/// An in-progress streaming write.
///
/// Whatever ends the upload, partial data must not outlive it: a failed
/// `finish`, an `abort`, or dropping the upload unfinished all discard what
/// was written.
#[async_trait]
pub trait StreamingUpload: Send {
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Commit the object and return its size in bytes. On error the partial
    /// upload is discarded.
    async fn finish(self: Box<Self>) -> StorageResult<u64>;

    /// Discard everything written so far.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}
