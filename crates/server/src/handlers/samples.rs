//! Sample endpoints: browse, fetch and upload.

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use bytes::Bytes;
use futures::{Stream, TryStreamExt, stream};
use sampleit_analysis::AudioAnalyzer;
use sampleit_core::{
    MAX_SAMPLE_NAME_LEN, MAX_SAMPLE_URL_LEN, MusicalKey, SampleId, file_extension, parse_tags,
};
use sampleit_metadata::{NewSample, SampleRow};
use sampleit_storage::{SampleStorage, StorageResult, StoredObject};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Multipart field carrying the audio file.
pub const FILE_FIELD: &str = "sampleFile";
const FILE_FIELD_ALIAS: &str = "file";

/// Most leading bytes handed to the analyzer.
const ANALYSIS_CAPTURE_LIMIT: usize = 32 * 1024 * 1024;

/// Public view of a sample.
#[derive(Debug, Clone, Serialize)]
pub struct SampleView {
    pub id: String,
    pub name: String,
    pub sample_url: String,
    pub ext: String,
    pub music_key: Option<String>,
    pub bpm: Option<i32>,
    pub tags: Vec<String>,
    pub uploader_id: Option<String>,
    pub upload_date: String,
}

impl SampleView {
    pub fn from_row(row: &SampleRow) -> ApiResult<Self> {
        Ok(Self {
            id: row.sample_id.to_string(),
            name: row.sample_name.clone(),
            sample_url: row.sample_url.clone(),
            ext: file_extension(&row.sample_name).to_string(),
            music_key: row.musical_key.clone(),
            bpm: row.bpm,
            tags: row.tags()?,
            uploader_id: row.uploader_id.map(|id| id.to_string()),
            upload_date: row
                .upload_date
                .format(&Rfc3339)
                .map_err(|e| ApiError::Internal(format!("failed to format upload_date: {e}")))?,
        })
    }
}

/// GET /samples - List every sample, newest first.
pub async fn list_samples(State(state): State<AppState>) -> ApiResult<Json<Vec<SampleView>>> {
    let rows = state.metadata.list_samples().await?;
    let views = rows
        .iter()
        .map(SampleView::from_row)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(views))
}

/// GET /samples/{id} - Fetch one sample.
pub async fn get_sample(
    State(state): State<AppState>,
    Path(sample_id): Path<String>,
) -> ApiResult<Json<SampleView>> {
    let sample_id = SampleId::parse(&sample_id)?;
    let row = state.metadata.get_sample(*sample_id.as_uuid()).await?;
    Ok(Json(SampleView::from_row(&row)?))
}

/// Text fields of an upload form.
#[derive(Debug, Default)]
struct UploadForm {
    tags: Option<Vec<String>>,
    music_key: Option<MusicalKey>,
    bpm: Option<i32>,
}

impl UploadForm {
    fn apply(&mut self, name: &str, value: &str) -> ApiResult<()> {
        let value = value.trim();
        match name {
            "tags" => self.tags = Some(parse_tags(value)?),
            "music_key" => {
                self.music_key = if value.is_empty() {
                    None
                } else {
                    Some(MusicalKey::parse(value)?)
                };
            }
            "bpm" => {
                self.bpm = if value.is_empty() {
                    None
                } else {
                    let bpm: i32 = value.parse().map_err(|_| {
                        ApiError::BadRequest(format!("bpm must be a non-negative integer: {value}"))
                    })?;
                    if bpm < 0 {
                        return Err(ApiError::BadRequest(format!(
                            "bpm must be a non-negative integer: {value}"
                        )));
                    }
                    Some(bpm)
                };
            }
            other => debug!(field = other, "Ignoring unknown upload field"),
        }
        Ok(())
    }

    /// Whether the analyzer has anything left to fill in.
    fn wants_analysis(&self) -> bool {
        self.bpm.is_none() || self.music_key.is_none()
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn validate_filename(filename: Option<&str>) -> ApiResult<String> {
    let filename = filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("'{FILE_FIELD}' part must carry a filename")))?;
    if filename.chars().count() > MAX_SAMPLE_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "filename exceeds {MAX_SAMPLE_NAME_LEN} characters"
        )));
    }
    Ok(filename.to_string())
}

/// Reject uploads whose public URL would not fit the sample record.
fn validate_url_len(state: &AppState, sample_id: &SampleId, filename: &str) -> ApiResult<()> {
    let url = state
        .gateway
        .url_for(&SampleStorage::object_key(sample_id.as_uuid(), filename));
    if url.chars().count() > MAX_SAMPLE_URL_LEN {
        return Err(ApiError::BadRequest(format!(
            "sample URL would exceed {MAX_SAMPLE_URL_LEN} characters; use a shorter filename"
        )));
    }
    Ok(())
}

async fn store<S, E>(
    state: &AppState,
    body: S,
    filename: &str,
    sample_id: &SampleId,
    capture: Option<usize>,
) -> StorageResult<StoredObject>
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: std::fmt::Display,
{
    state
        .gateway
        .upload(body, filename, sample_id.as_uuid(), capture)
        .await
}

fn is_upload_field(name: &str) -> bool {
    matches!(
        name,
        "tags" | "music_key" | "bpm" | FILE_FIELD | FILE_FIELD_ALIAS
    )
}

/// Remove the object of an upload rejected after its file was streamed.
async fn discard(state: &AppState, sample_id: &SampleId, object: &StoredObject) {
    if let Err(e) = state.gateway.discard(&object.key).await {
        warn!(
            sample_id = %sample_id,
            object_key = %object.key,
            error = %e,
            "Failed to remove object of a rejected upload"
        );
    }
}

fn storage_failure(sample_id: &SampleId, err: sampleit_storage::StorageError) -> ApiError {
    metrics::record_upload_failure("storage");
    error!(sample_id = %sample_id, error = %err, "Failed to store sample");
    ApiError::from(err)
}

async fn analyze(
    analyzer: Arc<dyn AudioAnalyzer>,
    audio: Bytes,
    sample_id: &SampleId,
) -> Option<sampleit_analysis::AudioFeatures> {
    let timer = metrics::ANALYSIS_DURATION.start_timer();
    let result = tokio::task::spawn_blocking(move || analyzer.analyze(&audio)).await;
    timer.observe_duration();

    match result {
        Ok(Ok(features)) => Some(features),
        Ok(Err(e)) => {
            metrics::ANALYSIS_FAILURES.inc();
            warn!(sample_id = %sample_id, error = %e, "Audio analysis failed, continuing without it");
            None
        }
        Err(e) => {
            metrics::ANALYSIS_FAILURES.inc();
            warn!(sample_id = %sample_id, error = %e, "Audio analysis task failed");
            None
        }
    }
}

/// POST /samples - Upload a sample.
///
/// Text fields (`tags`, `music_key`, `bpm`) are validated before anything is
/// written to storage. A file part that follows the `tags` field is streamed
/// straight to the object store; a file part that comes earlier is buffered
/// until the form has been read. Once a file has been streamed, any further
/// upload field fails the request and the stored object is removed.
///
/// The object is written before the metadata row. If the insert fails the
/// object stays behind and its key is logged.
pub async fn upload_sample(
    State(state): State<AppState>,
    auth: Option<Extension<AuthenticatedUser>>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SampleView>)> {
    let started = Instant::now();
    let uploader_id: Option<Uuid> = auth.map(|Extension(user)| user.user_id());
    if state.config.auth.require_auth_for_upload && uploader_id.is_none() {
        return Err(ApiError::Unauthorized(
            "authentication required to upload".to_string(),
        ));
    }

    let sample_id = SampleId::new();
    let mut form = UploadForm::default();
    let mut streamed: Option<(String, StoredObject)> = None;
    let mut buffered: Option<(String, Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                if let Some((_, object)) = &streamed {
                    discard(&state, &sample_id, object).await;
                }
                return Err(multipart_error(e));
            }
        };
        let name = field.name().unwrap_or_default().to_string();

        if let Some((_, object)) = &streamed {
            if is_upload_field(&name) {
                metrics::record_upload_failure("validation");
                discard(&state, &sample_id, object).await;
                return Err(ApiError::BadRequest(format!(
                    "'{name}' must be sent before the '{FILE_FIELD}' part"
                )));
            }
            debug!(field = %name, "Ignoring unknown upload field");
            continue;
        }

        if name != FILE_FIELD && name != FILE_FIELD_ALIAS {
            let value = field.text().await.map_err(multipart_error)?;
            if let Err(e) = form.apply(&name, &value) {
                metrics::record_upload_failure("validation");
                return Err(e);
            }
            continue;
        }

        if buffered.is_some() {
            return Err(ApiError::BadRequest(
                "only one file part is accepted".to_string(),
            ));
        }
        let filename = validate_filename(field.file_name())?;

        if form.tags.is_none() {
            let data = field.bytes().await.map_err(multipart_error)?;
            buffered = Some((filename, data));
            continue;
        }

        validate_url_len(&state, &sample_id, &filename)?;
        let capture = capture_limit(&state, &form);
        let too_large = AtomicBool::new(false);
        let body = field.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                too_large.store(true, Ordering::Relaxed);
            }
            e
        });
        let object = match store(&state, body, &filename, &sample_id, capture).await {
            Ok(object) => object,
            Err(e) if too_large.load(Ordering::Relaxed) => {
                metrics::record_upload_failure("validation");
                return Err(ApiError::PayloadTooLarge(e.to_string()));
            }
            Err(e) => return Err(storage_failure(&sample_id, e)),
        };
        streamed = Some((filename, object));
    }

    let (filename, object) = match (streamed, buffered) {
        (Some(streamed), _) => streamed,
        (None, Some((filename, data))) => {
            validate_url_len(&state, &sample_id, &filename)?;
            let capture = capture_limit(&state, &form);
            let body = stream::iter([Ok::<_, Infallible>(data)]);
            let object = store(&state, body, &filename, &sample_id, capture)
                .await
                .map_err(|e| storage_failure(&sample_id, e))?;
            (filename, object)
        }
        (None, None) => {
            metrics::record_upload_failure("validation");
            return Err(ApiError::BadRequest(format!(
                "missing '{FILE_FIELD}' file part"
            )));
        }
    };

    let mut bpm = form.bpm;
    let mut music_key = form.music_key;
    if let (Some(analyzer), Some(audio)) = (state.analyzer.clone(), object.captured.clone())
        && let Some(features) = analyze(analyzer, audio, &sample_id).await
    {
        bpm = bpm.or((features.bpm > 0).then(|| i32::try_from(features.bpm).unwrap_or(i32::MAX)));
        music_key = music_key.or(Some(features.key));
    }

    let new_sample = NewSample {
        sample_id: *sample_id.as_uuid(),
        sample_name: filename,
        sample_url: object.url.clone(),
        object_key: object.key.clone(),
        bpm,
        musical_key: music_key.map(|k| k.as_str().to_string()),
        tags: form.tags.unwrap_or_default(),
        uploader_id,
    };

    let row = state
        .metadata
        .create_sample(&new_sample)
        .await
        .map_err(|e| {
            metrics::record_upload_failure("metadata");
            error!(
                sample_id = %sample_id,
                object_key = %object.key,
                error = %e,
                "Sample stored but metadata insert failed; object is orphaned"
            );
            ApiError::Internal(format!("failed to persist sample: {e}"))
        })?;

    metrics::SAMPLES_UPLOADED.inc();
    metrics::BYTES_UPLOADED.inc_by(object.size);
    metrics::UPLOAD_DURATION.observe(started.elapsed().as_secs_f64());
    info!(
        sample_id = %sample_id,
        object_key = %object.key,
        size = object.size,
        uploader_id = ?uploader_id,
        "Sample uploaded"
    );

    Ok((StatusCode::CREATED, Json(SampleView::from_row(&row)?)))
}

fn capture_limit(state: &AppState, form: &UploadForm) -> Option<usize> {
    (state.analyzer.is_some() && form.wants_analysis())
        .then(|| ANALYSIS_CAPTURE_LIMIT.min(state.config.server.max_upload_bytes))
}
