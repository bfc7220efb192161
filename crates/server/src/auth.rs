//! Bearer-token authentication middleware.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Extension;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sampleit_core::token::{Token, TokenId, generate_token_secret, hash_token};
use sampleit_metadata::TokenRow;
use time::OffsetDateTime;
use tracing::Instrument;
use uuid::Uuid;

/// Longer client trace IDs are truncated.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-provided trace ID, keeping only printable ASCII.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated request extension.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    /// The validated token.
    pub token: Token,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Uuid {
        self.token.user_id
    }
}

/// Extract the bearer token. The scheme is matched case-insensitively.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(v[7..].trim())
            } else {
                None
            }
        })
}

fn extract_or_generate_trace_id(headers: &HeaderMap) -> TraceId {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Authentication middleware.
///
/// A request without an `Authorization` header passes through anonymously.
/// A presented token that is unknown, expired or revoked is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    if req.headers().contains_key(AUTHORIZATION) {
        let secret = extract_bearer_token(req.headers())
            .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))?;

        let token_row = state
            .metadata
            .get_token_by_hash(&hash_token(secret))
            .await?
            .ok_or_else(|| ApiError::Unauthorized("unknown token".to_string()))?;

        let token = Token {
            id: TokenId::from(token_row.token_id),
            user_id: token_row.user_id,
            expires_at: token_row.expires_at,
            revoked_at: token_row.revoked_at,
            created_at: token_row.created_at,
        };
        if !token.is_valid() {
            return Err(ApiError::Unauthorized(
                "token expired or revoked".to_string(),
            ));
        }

        // Fire and forget.
        let metadata = state.metadata.clone();
        let token_id = token_row.token_id;
        tokio::spawn(async move {
            if let Err(e) = metadata
                .touch_token(token_id, OffsetDateTime::now_utc())
                .await
            {
                tracing::debug!(token_id = %token_id, error = %e, "Failed to record token use");
            }
        });

        req.extensions_mut().insert(AuthenticatedUser { token });
    }

    let response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    Ok(response)
}

/// Issue a new token for `user_id` and return its secret. Only the hash is
/// stored.
pub async fn issue_token(
    state: &AppState,
    user_id: Uuid,
    description: &str,
) -> ApiResult<(TokenId, String)> {
    let secret = generate_token_secret();
    let now = OffsetDateTime::now_utc();
    let token_id = TokenId::new();

    let row = TokenRow {
        token_id: *token_id.as_uuid(),
        user_id,
        token_hash: hash_token(&secret),
        expires_at: state.config.auth.token_ttl().map(|ttl| now + ttl),
        revoked_at: None,
        created_at: now,
        last_used_at: None,
        description: Some(description.to_string()),
    };
    state.metadata.create_token(&row).await?;

    Ok((token_id, secret))
}

/// Require authentication (token must be present).
pub fn require_auth(auth: Option<Extension<AuthenticatedUser>>) -> ApiResult<AuthenticatedUser> {
    auth.map(|Extension(user)| user)
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}
