//! Saved-sample endpoints.

use crate::auth::{AuthenticatedUser, require_auth};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use sampleit_core::{SampleId, UserId};
use sampleit_metadata::{MetadataError, SavedSampleRow};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;

/// Public view of a saved sample.
#[derive(Debug, Clone, Serialize)]
pub struct SavedSampleView {
    pub sample_id: String,
    pub user_id: String,
    pub save_date: String,
}

impl SavedSampleView {
    pub fn from_row(row: &SavedSampleRow) -> ApiResult<Self> {
        Ok(Self {
            sample_id: row.sample_id.to_string(),
            user_id: row.user_id.to_string(),
            save_date: row
                .save_date
                .format(&Rfc3339)
                .map_err(|e| ApiError::Internal(format!("failed to format save_date: {e}")))?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SavesQuery {
    pub user_id: Option<String>,
}

/// Request body for saving a sample.
#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    /// Must match the caller when present.
    pub user_id: Option<String>,
    pub sample_id: String,
}

/// GET /user/saves?user_id= - List a user's saved samples, oldest first.
///
/// Without `user_id` the authenticated caller's saves are listed.
pub async fn list_saved_samples(
    State(state): State<AppState>,
    auth: Option<Extension<AuthenticatedUser>>,
    Query(query): Query<SavesQuery>,
) -> ApiResult<Json<Vec<SavedSampleView>>> {
    let user_id = match query.user_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => *UserId::parse(raw)?.as_uuid(),
        _ => match auth {
            Some(Extension(user)) => user.user_id(),
            None => {
                return Err(ApiError::BadRequest(
                    "user_id is required for anonymous requests".to_string(),
                ));
            }
        },
    };

    let rows = state.metadata.list_saved_samples(user_id).await?;
    let views = rows
        .iter()
        .map(SavedSampleView::from_row)
        .collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(views))
}

/// POST /user/saves - Save a sample for the authenticated user.
pub async fn save_sample(
    State(state): State<AppState>,
    auth: Option<Extension<AuthenticatedUser>>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SavedSampleView>)> {
    let user = require_auth(auth)?;
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if let Some(raw) = request.user_id.as_deref() {
        let requested = UserId::parse(raw)?;
        if *requested.as_uuid() != user.user_id() {
            return Err(ApiError::Forbidden(
                "cannot save samples on behalf of another user".to_string(),
            ));
        }
    }
    let sample_id = SampleId::parse(&request.sample_id)?;

    let row = state
        .metadata
        .save_sample(user.user_id(), *sample_id.as_uuid())
        .await
        .map_err(|e| match e {
            MetadataError::NotFound(_) => ApiError::NotFound(format!("sample {sample_id} not found")),
            MetadataError::Conflict(_) => {
                ApiError::Conflict(format!("sample {sample_id} is already saved"))
            }
            other => ApiError::from(other),
        })?;

    metrics::SAMPLES_SAVED.inc();
    tracing::info!(user_id = %user.user_id(), sample_id = %sample_id, "Sample saved");

    Ok((StatusCode::CREATED, Json(SavedSampleView::from_row(&row)?)))
}
