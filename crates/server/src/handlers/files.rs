//! Serves stored sample objects for backends without their own public URL.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use sampleit_core::file_extension;
use sampleit_storage::SampleStorage;

/// Content type by file extension. Unknown extensions are served as bytes.
fn content_type_for(key: &str) -> &'static str {
    match file_extension(key).to_ascii_lowercase().as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "aif" | "aiff" => "audio/aiff",
        "m4a" | "mp4" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// GET /files/{*key} - Stream a stored sample.
pub async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    if !SampleStorage::is_sample_key(&key) {
        return Err(ApiError::NotFound(format!("object not found: {key}")));
    }

    let meta = state.storage().head(&key).await?;
    let stream = state.storage().get_stream(&key).await?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(content_type_for(&key))),
            (CONTENT_LENGTH, HeaderValue::from(meta.size)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("samples/x-kick.WAV"), "audio/wav");
        assert_eq!(content_type_for("samples/x-loop.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("samples/x-noext"), "application/octet-stream");
    }
}
