//! Registration, login and token endpoints.

use crate::auth::{AuthenticatedUser, issue_token, require_auth};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};
use sampleit_core::{PasswordHash, validate_password, validate_username};
use sampleit_metadata::UserRow;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Returned by registration and login. `token` is shown only here.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user_id: String,
    pub username: String,
    pub token_id: String,
    pub expires_at: Option<String>,
}

fn credentials(payload: Result<Json<CredentialsRequest>, JsonRejection>) -> ApiResult<CredentialsRequest> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// POST /users - Register a user and return a first token.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    if !state.config.auth.allow_registration {
        return Err(ApiError::Forbidden("registration is disabled".to_string()));
    }
    let request = credentials(payload)?;
    validate_username(&request.username)?;
    validate_password(&request.password)?;

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || PasswordHash::create(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = UserRow {
        user_id: Uuid::new_v4(),
        username: request.username,
        password_hash: password_hash.encode(),
        created_at: OffsetDateTime::now_utc(),
    };
    state.metadata.create_user(&user).await?;
    let (_, token) = issue_token(&state, user.user_id, "registration").await?;

    metrics::USERS_REGISTERED.inc();
    tracing::info!(user_id = %user.user_id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user_id: user.user_id.to_string(),
            username: user.username,
            token,
        }),
    ))
}

/// POST /auth/login - Exchange credentials for a new token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let request = credentials(payload)?;
    let rejected = || ApiError::Unauthorized("invalid username or password".to_string());

    let user = state
        .metadata
        .get_user_by_username(&request.username)
        .await?
        .ok_or_else(rejected)?;

    let stored = PasswordHash::parse(&user.password_hash)
        .map_err(|e| ApiError::Internal(format!("stored credential for {} is invalid: {e}", user.user_id)))?;
    let password = request.password;
    let verified = tokio::task::spawn_blocking(move || stored.verify(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
    if !verified {
        tracing::info!(user_id = %user.user_id, "Rejected login");
        return Err(rejected());
    }

    let (_, token) = issue_token(&state, user.user_id, "login").await?;
    Ok(Json(SessionResponse {
        user_id: user.user_id.to_string(),
        username: user.username,
        token,
    }))
}

/// GET /auth/whoami - Describe the caller.
pub async fn whoami(
    State(state): State<AppState>,
    auth: Option<Extension<AuthenticatedUser>>,
) -> ApiResult<Json<WhoamiResponse>> {
    let auth = require_auth(auth)?;
    let user = state
        .metadata
        .get_user(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", auth.user_id())))?;

    let expires_at = match auth.token.expires_at {
        Some(ts) => Some(
            ts.format(&Rfc3339)
                .map_err(|e| ApiError::Internal(format!("failed to format expires_at: {e}")))?,
        ),
        None => None,
    };

    Ok(Json(WhoamiResponse {
        user_id: user.user_id.to_string(),
        username: user.username,
        token_id: auth.token.id.to_string(),
        expires_at,
    }))
}

/// POST /auth/logout - Revoke the presented token.
pub async fn logout(
    State(state): State<AppState>,
    auth: Option<Extension<AuthenticatedUser>>,
) -> ApiResult<StatusCode> {
    let auth = require_auth(auth)?;
    state
        .metadata
        .revoke_token(*auth.token.id.as_uuid(), OffsetDateTime::now_utc())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
