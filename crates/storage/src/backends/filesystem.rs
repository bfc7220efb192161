//! Local filesystem storage backend.

use crate::backends::join_url;
use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectMeta, ObjectStore, StreamingUpload};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// URL prefix under which the API serves filesystem objects.
pub const LOCAL_FILES_ROUTE: &str = "/files";

/// Local filesystem object store.
pub struct FilesystemBackend {
    root: PathBuf,
    public_url: Option<String>,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_url: None,
        })
    }

    /// Publish object URLs under `public_url` instead of the API's own route.
    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }

    /// Resolve a key to a path inside the root, off the async runtime.
    async fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        let root = self.root.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || Self::key_path_sync(&root, &key))
            .await
            .map_err(|e| {
                StorageError::Io(std::io::Error::other(format!("spawn_blocking failed: {e}")))
            })?
    }

    /// Resolve a key to a path, rejecting anything that would leave the root,
    /// including through symlinks.
    fn key_path_sync(root: &Path, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        if key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "absolute keys not allowed: {key}"
            )));
        }
        if !Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(format!(
                "contains unsafe path component: {key}"
            )));
        }

        let path = root.join(key);
        let root_canonical = root.canonicalize()?;

        // Check the deepest existing ancestor (or the path itself).
        let mut probe = Some(path.as_path());
        while let Some(candidate) = probe {
            match std::fs::symlink_metadata(candidate) {
                Ok(meta) => {
                    let canonical = candidate.canonicalize().map_err(|e| {
                        if meta.file_type().is_symlink() {
                            StorageError::InvalidKey(format!("dangling symlink in key: {key}"))
                        } else {
                            StorageError::Io(e)
                        }
                    })?;
                    if !canonical.starts_with(&root_canonical) {
                        return Err(StorageError::InvalidKey(format!(
                            "resolved path escapes storage root: {key}"
                        )));
                    }
                    break;
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    probe = candidate.parent();
                }
                Err(err) => return Err(StorageError::Io(err)),
            }
        }

        Ok(path)
    }

    fn temp_path_for(path: &Path) -> PathBuf {
        let suffix = format!(".tmp.{}", Uuid::new_v4());
        let name = path
            .file_name()
            .map(|n| format!("{}{suffix}", n.to_string_lossy()))
            .unwrap_or(suffix);
        path.with_file_name(name)
    }

    async fn ensure_parent(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn not_found_or_io(key: &str, e: std::io::Error) -> StorageError {
    if e.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(e)
    }
}

#[async_trait]
impl ObjectStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.key_path(key).await?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(key, e))?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        Ok(ObjectMeta {
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(|t| t.into()),
            content_type: None,
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.key_path(key).await?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(key, e))?;

        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>> {
        let path = self.key_path(key).await?;
        self.ensure_parent(&path).await?;

        let temp = TempFile::new(Self::temp_path_for(&path));
        let file = fs::File::create(&temp.path).await?;

        Ok(Box::new(FilesystemUpload {
            file,
            temp,
            final_path: path,
            bytes_written: 0,
        }))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key).await?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let base_path = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.key_path(prefix.trim_end_matches('/')).await?
        };
        let mut results = Vec::new();

        if !fs::try_exists(&base_path).await? {
            return Ok(results);
        }

        let mut stack = vec![base_path];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                // file_type() does not follow symlinks; those are skipped.
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file()
                    && let Ok(rel) = path.strip_prefix(&self.root)
                {
                    let key = rel.to_string_lossy().replace('\\', "/");
                    if !key.contains(".tmp.") {
                        results.push(key);
                    }
                }
            }
        }

        results.sort();
        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    fn object_url(&self, key: &str) -> String {
        join_url(
            self.public_url.as_deref().unwrap_or(LOCAL_FILES_ROUTE),
            key,
        )
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn health_check(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.root).await.map_err(|e| {
            StorageError::Io(std::io::Error::new(
                e.kind(),
                format!("storage root not accessible: {e}"),
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("storage root is not a directory: {:?}", self.root),
            )));
        }

        Ok(())
    }
}

/// Removes an upload's temp file when dropped, unless it was renamed into
/// place.
struct TempFile {
    path: PathBuf,
    keep: bool,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "Failed to remove upload temp file");
        }
    }
}

/// Streaming upload that writes to a temp file and renames on finish.
struct FilesystemUpload {
    file: fs::File,
    temp: TempFile,
    final_path: PathBuf,
    bytes_written: u64,
}

#[async_trait]
impl StreamingUpload for FilesystemUpload {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        self.file.write_all(&data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> StorageResult<u64> {
        let Self {
            file,
            mut temp,
            final_path,
            bytes_written,
        } = *self;

        file.sync_all().await?;
        drop(file);
        fs::rename(&temp.path, &final_path).await?;
        temp.keep = true;
        Ok(bytes_written)
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        let Self { file, mut temp, .. } = *self;
        drop(file);
        match fs::remove_file(&temp.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::Io(e)),
        }
        temp.keep = true;
        Ok(())
    }
}
