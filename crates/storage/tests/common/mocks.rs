use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use sampleit_storage::error::{StorageError, StorageResult};
use sampleit_storage::traits::{ByteStream, ObjectMeta, ObjectStore, StreamingUpload};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How a [`MemoryBackend`] should misbehave.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailMode {
    #[default]
    None,
    /// `put_stream` fails immediately.
    OnStart,
    /// `write` fails once this many bytes have been accepted.
    AfterBytes(usize),
    /// `finish` fails.
    OnFinish,
}

/// In-memory object store with injectable failures.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryBackend {
    objects: Arc<Mutex<BTreeMap<String, Bytes>>>,
    fail: FailMode,
    pub aborts: Arc<AtomicUsize>,
    pub starts: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(fail: FailMode) -> Arc<Self> {
        Arc::new(Self {
            fail,
            ..Self::default()
        })
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    fn transport_error(msg: &str) -> StorageError {
        StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            msg.to_string(),
        ))
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let size = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|b| b.len() as u64)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(ObjectMeta {
            size,
            last_modified: None,
            content_type: None,
        })
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail == FailMode::OnStart {
            return Err(Self::transport_error("connection refused"));
        }
        Ok(Box::new(MemoryUpload {
            key: key.to_string(),
            buf: BytesMut::new(),
            objects: self.objects.clone(),
            fail: self.fail,
            aborts: self.aborts.clone(),
        }))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn object_url(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}

struct MemoryUpload {
    key: String,
    buf: BytesMut,
    objects: Arc<Mutex<BTreeMap<String, Bytes>>>,
    fail: FailMode,
    aborts: Arc<AtomicUsize>,
}

#[async_trait]
impl StreamingUpload for MemoryUpload {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        if let FailMode::AfterBytes(limit) = self.fail
            && self.buf.len() + data.len() > limit
        {
            return Err(MemoryBackend::transport_error("connection reset by peer"));
        }
        self.buf.extend_from_slice(&data);
        Ok(())
    }

    async fn finish(self: Box<Self>) -> StorageResult<u64> {
        if self.fail == FailMode::OnFinish {
            return Err(StorageError::S3("access denied".into()));
        }
        let size = self.buf.len() as u64;
        self.objects
            .lock()
            .unwrap()
            .insert(self.key, self.buf.freeze());
        Ok(size)
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
