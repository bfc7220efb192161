//! Storage Gateway: streams uploaded samples into the object store.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ObjectStore, StreamingUpload};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Namespace every sample object lives under.
pub const SAMPLE_KEY_PREFIX: &str = "samples/";

/// Result of a successful upload.
#[derive(Clone, Debug)]
pub struct StoredObject {
    /// Object key inside the backend.
    pub key: String,
    /// Public URL of the object.
    pub url: String,
    /// Total bytes written.
    pub size: u64,
    /// Leading bytes of the payload, when a capture limit was requested.
    pub captured: Option<Bytes>,
}

/// Uploads sample audio and issues public URLs for it.
#[derive(Clone)]
pub struct SampleStorage {
    store: Arc<dyn ObjectStore>,
}

impl SampleStorage {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// The underlying object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Build the object key for an upload: `samples/{unique_key}-{filename}`.
    ///
    /// Only the last path component of `filename` is kept, and characters
    /// outside `[A-Za-z0-9._-]` are replaced with `_`.
    pub fn object_key(unique_key: &Uuid, filename: &str) -> String {
        format!("{SAMPLE_KEY_PREFIX}{unique_key}-{}", sanitize_filename(filename))
    }

    /// Whether `key` names an object this gateway manages.
    pub fn is_sample_key(key: &str) -> bool {
        key.strip_prefix(SAMPLE_KEY_PREFIX)
            .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
    }

    /// Public URL for an existing key.
    pub fn url_for(&self, key: &str) -> String {
        self.store.object_url(key)
    }

    /// Remove an object written for an upload that was later rejected.
    #[instrument(skip(self), fields(backend = self.store.backend_name()))]
    pub async fn discard(&self, key: &str) -> StorageResult<()> {
        self.store.delete(key).await
    }

    /// Stream `body` into the object store under a key derived from
    /// `unique_key` and `filename`.
    ///
    /// The body is forwarded chunk by chunk. When `capture_limit` is set, up
    /// to that many leading bytes are also kept and returned. Any error from
    /// the body or the backend aborts the partial upload; nothing is retried.
    #[instrument(skip(self, body), fields(backend = self.store.backend_name()))]
    pub async fn upload<S, E>(
        &self,
        body: S,
        filename: &str,
        unique_key: &Uuid,
        capture_limit: Option<usize>,
    ) -> StorageResult<StoredObject>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::fmt::Display,
    {
        let key = Self::object_key(unique_key, filename);
        let mut upload = self.store.put_stream(&key).await?;
        let mut capture = capture_limit.map(|limit| (limit, BytesMut::new()));

        match pump(body, upload.as_mut(), &mut capture).await {
            Ok(()) => {}
            Err(e) => {
                if let Err(abort_err) = upload.abort().await {
                    warn!(key = %key, error = %abort_err, "Failed to abort partial upload");
                }
                return Err(e);
            }
        }

        let size = upload.finish().await?;

        Ok(StoredObject {
            url: self.store.object_url(&key),
            key,
            size,
            captured: capture.map(|(_, buf)| buf.freeze()),
        })
    }
}

async fn pump<S, E>(
    body: S,
    upload: &mut dyn StreamingUpload,
    capture: &mut Option<(usize, BytesMut)>,
) -> StorageResult<()>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| StorageError::Source(e.to_string()))?;
        if chunk.is_empty() {
            continue;
        }
        if let Some((limit, buf)) = capture.as_mut() {
            let room = limit.saturating_sub(buf.len());
            buf.extend_from_slice(&chunk[..room.min(chunk.len())]);
        }
        upload.write(chunk).await?;
    }
    Ok(())
}

fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "sample".to_string()
    } else {
        cleaned
    }
}
