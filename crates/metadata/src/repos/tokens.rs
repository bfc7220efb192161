//! Bearer token persistence. Only token hashes ever reach the store.

use crate::error::MetadataResult;
use crate::models::TokenRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

#[async_trait]
pub trait TokenRepo: Send + Sync {
    async fn create_token(&self, token: &TokenRow) -> MetadataResult<()>;

    /// Look up a token by the SHA-256 hex digest of its secret. Expired and
    /// revoked tokens are still returned; callers decide validity.
    async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>>;

    /// Record that a token authenticated a request.
    async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()>;

    /// Revoke a live token. Revoking an unknown or already revoked token is
    /// `NotFound`.
    async fn revoke_token(&self, token_id: Uuid, revoked_at: OffsetDateTime) -> MetadataResult<()>;
}
