//! S3-compatible storage backend using AWS SDK.

use crate::backends::join_url;
use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectMeta, ObjectStore, StreamingUpload};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::future::ProvideCredentials as ProvideCredentialsFuture;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_smithy_http_client::Builder as SmithyHttpClientBuilder;
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::io::ReaderStream;
use tracing::{instrument, warn};

/// Minimum part size for S3 multipart uploads (5 MiB).
/// S3 requires all parts except the last to be at least 5 MiB.
const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

const DEFAULT_REGION: &str = "us-east-1";

/// Markers carried by lazy-credentials errors so they surface as config errors.
const CREDENTIALS_INIT_ERROR_MARKER: &str = "sampleit-s3-lazy-credentials-init";
const CREDENTIALS_RESOLVE_ERROR_MARKER: &str = "sampleit-s3-lazy-credentials-resolve";

/// Connection settings for [`S3Backend`].
#[derive(Clone, Debug, Default)]
pub struct S3Settings {
    pub bucket: String,
    /// Custom endpoint (MinIO etc.). Bare `host:port` values get `http://`.
    pub endpoint: Option<String>,
    pub region: Option<String>,
    /// Key prefix applied to every object.
    pub prefix: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Use `endpoint/bucket/key` addressing instead of `bucket.endpoint/key`.
    pub force_path_style: bool,
    /// Base URL published objects are reachable under (e.g. a CDN).
    pub public_url: Option<String>,
}

/// Resolves the AWS default credentials chain on the first signed request,
/// keeping construction free of TLS and network side effects.
#[derive(Debug)]
struct LazyDefaultCredentialsProvider {
    region: String,
    chain: OnceCell<aws_config::default_provider::credentials::DefaultCredentialsChain>,
}

impl LazyDefaultCredentialsProvider {
    fn new(region: String) -> Self {
        Self {
            region,
            chain: OnceCell::new(),
        }
    }

    async fn chain(
        &self,
    ) -> Result<&aws_config::default_provider::credentials::DefaultCredentialsChain, CredentialsError>
    {
        self.chain
            .get_or_try_init(|| async {
                let region = aws_config::Region::new(self.region.clone());
                tokio::task::spawn(async move {
                    aws_config::default_provider::credentials::DefaultCredentialsChain::builder()
                        .region(region)
                        .build()
                        .await
                })
                .await
                .map_err(|join_err| {
                    CredentialsError::provider_error(format!(
                        "{CREDENTIALS_INIT_ERROR_MARKER}: failed to initialize AWS default credential chain: {join_err}"
                    ))
                })
            })
            .await
    }

    async fn credentials(&self) -> aws_credential_types::provider::Result {
        let chain = self.chain().await?;
        chain.provide_credentials().await.map_err(|err| {
            CredentialsError::provider_error(format!(
                "{CREDENTIALS_RESOLVE_ERROR_MARKER}: default AWS credentials resolution failed: {err}"
            ))
        })
    }
}

impl ProvideCredentials for LazyDefaultCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> ProvideCredentialsFuture<'a>
    where
        Self: 'a,
    {
        ProvideCredentialsFuture::new(self.credentials())
    }
}

fn map_s3_operation_error<E>(err: SdkError<E>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let err_text = err.to_string();
    if err_text.contains(CREDENTIALS_INIT_ERROR_MARKER)
        || err_text.contains(CREDENTIALS_RESOLVE_ERROR_MARKER)
    {
        return StorageError::Config(
            "S3 credential initialization failed. Configure AWS credentials explicitly or ensure ambient AWS credentials are available."
                .to_string(),
        );
    }

    StorageError::S3(Box::new(err))
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    matches!(err, SdkError::ServiceError(service_err) if service_err.raw().status().as_u16() == 404)
}

/// S3-compatible object store using AWS SDK.
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    /// Normalized custom endpoint, if any.
    endpoint: Option<String>,
    force_path_style: bool,
    public_url: Option<String>,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl S3Backend {
    /// Create a new S3 backend. No network calls are made here.
    pub async fn new(settings: S3Settings) -> StorageResult<Self> {
        let S3Settings {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
            public_url,
        } = settings;

        if bucket.is_empty() {
            return Err(StorageError::Config("s3 bucket cannot be empty".to_string()));
        }

        let region = region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));

        match (access_key_id, secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials =
                    aws_sdk_s3::config::Credentials::new(key_id, secret, None, None, "sampleit-config");
                builder = builder.credentials_provider(credentials);
            }
            (None, None) => {
                builder =
                    builder.credentials_provider(LazyDefaultCredentialsProvider::new(region.clone()));
            }
            _ => {
                return Err(StorageError::Config(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ));
            }
        }

        let endpoint = endpoint.map(|url| {
            let lower = url.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                url.trim_end_matches('/').to_string()
            } else {
                format!("http://{}", url.trim_end_matches('/'))
            }
        });

        if let Some(url) = &endpoint {
            builder = builder.endpoint_url(url);
            // Plain-HTTP endpoints get a client that needs no native trust roots.
            if url.to_ascii_lowercase().starts_with("http://") {
                builder = builder.http_client(SmithyHttpClientBuilder::new().build_http());
            }
        }

        if force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket,
            prefix: prefix
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
            endpoint,
            force_path_style,
            public_url,
        })
    }

    /// Get the full object key for a key (applies prefix if configured).
    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.to_string(),
        }
    }

    /// Strip the configured prefix from a full object key.
    fn strip_prefix(&self, full_key: &str) -> String {
        match &self.prefix {
            Some(prefix) => full_key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(full_key)
                .to_string(),
            None => full_key.to_string(),
        }
    }

    /// Base URL of the bucket when no public URL is configured.
    fn bucket_url(&self) -> String {
        match &self.endpoint {
            None => format!("https://{}.s3.amazonaws.com", self.bucket),
            Some(endpoint) if self.force_path_style => format!("{endpoint}/{}", self.bucket),
            Some(endpoint) => match endpoint.split_once("://") {
                Some((scheme, host)) => format!("{scheme}://{}.{host}", self.bucket),
                None => format!("{endpoint}/{}", self.bucket),
            },
        }
    }

    fn map_sdk_error<E>(err: SdkError<E>, key: &str) -> StorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        if is_not_found(&err) {
            return StorageError::NotFound(key.to_string());
        }
        map_s3_operation_error(err)
    }
}

#[async_trait]
impl ObjectStore for S3Backend {
    #[instrument(skip(self), fields(backend = "s3"))]
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(e, key))?;

        let last_modified = output
            .last_modified()
            .and_then(|dt| time::OffsetDateTime::from_unix_timestamp(dt.secs()).ok());

        Ok(ObjectMeta {
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified,
            content_type: output.content_type().map(str::to_string),
        })
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use futures::StreamExt;

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(e, key))?;

        let stream = ReaderStream::new(output.body.into_async_read())
            .map(|result| result.map_err(StorageError::Io));

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>> {
        let full_key = self.full_key(key);

        let create_output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(map_s3_operation_error)?;

        let upload_id = create_output
            .upload_id()
            .ok_or_else(|| StorageError::Config("S3 did not return upload_id".to_string()))?
            .to_string();

        Ok(Box::new(S3Upload {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: full_key,
            upload_id,
            parts: Vec::new(),
            part_number: 1,
            bytes_written: 0,
            buffer: BytesMut::with_capacity(MIN_PART_SIZE),
            settled: false,
        }))
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(map_s3_operation_error(err)),
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let full_prefix = self.full_key(prefix);
        let mut results = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&full_prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(map_s3_operation_error)?;

            results.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .map(|key| self.strip_prefix(key)),
            );

            match output.next_continuation_token() {
                Some(token) if output.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(results)
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }

    fn object_url(&self, key: &str) -> String {
        let full_key = self.full_key(key);
        match &self.public_url {
            Some(base) => join_url(base, &full_key),
            None => join_url(&self.bucket_url(), &full_key),
        }
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn health_check(&self) -> StorageResult<()> {
        const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

        let marker_key = self.full_key(".sampleit-health-check");

        let probe = async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&marker_key)
                .body(Bytes::from_static(b"health-check").into())
                .send()
                .await
                .map_err(map_s3_operation_error)?;

            match self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(&marker_key)
                .send()
                .await
            {
                Ok(_) => Ok(()),
                Err(err) if is_not_found(&err) => Ok(()),
                Err(err) => Err(map_s3_operation_error(err)),
            }
        };

        tokio::time::timeout(HEALTH_CHECK_TIMEOUT, probe)
            .await
            .map_err(|_| {
                StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "S3 health check timed out after 10 seconds",
                ))
            })?
    }
}

/// Streaming upload for S3 using multipart upload.
///
/// Data is buffered until a full part is available; parts are sent as soon
/// as the buffer reaches [`MIN_PART_SIZE`]. An upload dropped before it is
/// settled (finished or aborted) schedules an abort of its multipart upload
/// on the current runtime.
struct S3Upload {
    client: Client,
    bucket: String,
    key: String,
    upload_id: String,
    parts: Vec<aws_sdk_s3::types::CompletedPart>,
    part_number: i32,
    bytes_written: u64,
    buffer: BytesMut,
    settled: bool,
}

impl S3Upload {
    async fn upload_part(&mut self, data: Bytes) -> StorageResult<()> {
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .part_number(self.part_number)
            .body(data.into())
            .send()
            .await
            .map_err(map_s3_operation_error)?;

        self.parts.push(
            aws_sdk_s3::types::CompletedPart::builder()
                .e_tag(output.e_tag().unwrap_or_default())
                .part_number(self.part_number)
                .build(),
        );
        self.part_number += 1;

        Ok(())
    }

    async fn abort_multipart(&self) -> StorageResult<()> {
        abort_multipart_upload(&self.client, &self.bucket, &self.key, &self.upload_id).await
    }

    /// Send the buffered tail and complete the multipart upload.
    async fn complete(&mut self) -> StorageResult<u64> {
        if !self.buffer.is_empty() {
            let last = self.buffer.split().freeze();
            self.upload_part(last).await?;
        }

        // Multipart uploads need at least one non-empty part, so an empty
        // object is written directly and the multipart upload dropped.
        if self.parts.is_empty() {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&self.key)
                .body(Bytes::new().into())
                .send()
                .await
                .map_err(map_s3_operation_error)?;

            if let Err(e) = self.abort_multipart().await {
                warn!(
                    key = %self.key,
                    upload_id = %self.upload_id,
                    error = %e,
                    "Failed to abort multipart upload for empty object"
                );
            }
            return Ok(0);
        }

        let completed = aws_sdk_s3::types::CompletedMultipartUpload::builder()
            .set_parts(Some(std::mem::take(&mut self.parts)))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(map_s3_operation_error)?;

        Ok(self.bytes_written)
    }
}

async fn abort_multipart_upload(
    client: &Client,
    bucket: &str,
    key: &str,
    upload_id: &str,
) -> StorageResult<()> {
    client
        .abort_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(upload_id)
        .send()
        .await
        .map_err(map_s3_operation_error)?;
    Ok(())
}

#[async_trait]
impl StreamingUpload for S3Upload {
    async fn write(&mut self, data: Bytes) -> StorageResult<()> {
        self.bytes_written += data.len() as u64;
        self.buffer.extend_from_slice(&data);

        while self.buffer.len() >= MIN_PART_SIZE {
            let part = self.buffer.split_to(MIN_PART_SIZE).freeze();
            self.upload_part(part).await?;
        }

        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<u64> {
        let result = self.complete().await;
        if let Err(e) = &result
            && let Err(abort_err) = self.abort_multipart().await
        {
            warn!(
                key = %self.key,
                upload_id = %self.upload_id,
                error = %e,
                abort_error = %abort_err,
                "Failed to abort multipart upload after a failed finish"
            );
        }
        self.settled = true;
        result
    }

    async fn abort(mut self: Box<Self>) -> StorageResult<()> {
        self.settled = true;
        self.abort_multipart().await
    }
}

impl Drop for S3Upload {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                key = %self.key,
                upload_id = %self.upload_id,
                "Multipart upload dropped outside a runtime; parts left for the bucket lifecycle"
            );
            return;
        };

        let client = self.client.clone();
        let bucket = std::mem::take(&mut self.bucket);
        let key = std::mem::take(&mut self.key);
        let upload_id = std::mem::take(&mut self.upload_id);
        runtime.spawn(async move {
            if let Err(e) = abort_multipart_upload(&client, &bucket, &key, &upload_id).await {
                warn!(key = %key, upload_id = %upload_id, error = %e, "Failed to abort dropped multipart upload");
            }
        });
    }
}
