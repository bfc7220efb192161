//! Storage test utilities.

use async_trait::async_trait;
use sampleit_storage::{
    ByteStream, FilesystemBackend, ObjectMeta, ObjectStore, StorageError, StorageResult,
    StreamingUpload,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

/// Filesystem store that counts upload attempts and can be told to refuse
/// them.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct ProbeStore {
    inner: FilesystemBackend,
    pub uploads_started: AtomicUsize,
    pub refuse_uploads: AtomicBool,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl ProbeStore {
    pub async fn new() -> Arc<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let inner = FilesystemBackend::new(temp_dir.path())
            .await
            .expect("Failed to create storage backend");
        Arc::new(Self {
            inner,
            uploads_started: AtomicUsize::new(0),
            refuse_uploads: AtomicBool::new(false),
            _temp_dir: temp_dir,
        })
    }

    /// A store whose uploads fail as if the bucket were unreachable.
    pub async fn unreachable() -> Arc<Self> {
        let store = Self::new().await;
        store.refuse_uploads.store(true, Ordering::SeqCst);
        store
    }

    pub fn uploads_started(&self) -> usize {
        self.uploads_started.load(Ordering::SeqCst)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.inner.list("").await.expect("Failed to list objects")
    }
}

#[async_trait]
impl ObjectStore for ProbeStore {
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        self.inner.head(key).await
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        self.inner.get_stream(key).await
    }

    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>> {
        self.uploads_started.fetch_add(1, Ordering::SeqCst);
        if self.refuse_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "bucket unreachable",
            )));
        }
        self.inner.put_stream(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "probe"
    }

    fn object_url(&self, key: &str) -> String {
        self.inner.object_url(key)
    }
}
