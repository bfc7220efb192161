//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult, map_insert_error};
use crate::models::*;
use crate::repos::{SampleRepo, SavedSampleRepo, TokenRepo, UserRepo};
use crate::store::MetadataStore;
use async_trait::async_trait;
use sampleit_core::config::PgSslMode;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

/// Split the schema into single statements. Postgres rejects multiple
/// statements in one prepared query.
fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Connect using a full connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Connect using individual parameters, so the password can come from
    /// its own environment variable.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }
        if let Some(pass) = password {
            opts = opts.password(pass);
        }
        if let Some(mode) = ssl_mode {
            opts = opts.ssl_mode(match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            });
        }

        tracing::info!(
            host,
            port,
            database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{timeout_ms}ms"))]);
            tracing::info!(timeout_ms, "PostgreSQL statement_timeout set");
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserRepo for PostgresStore {
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("username '{}' is taken", user.username)))?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_user(&self, user_id: Uuid) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SampleRepo for PostgresStore {
    async fn list_samples(&self) -> MetadataResult<Vec<SampleRow>> {
        let rows = sqlx::query_as::<_, SampleRow>(
            "SELECT * FROM samples ORDER BY upload_date DESC, sample_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_sample(&self, sample_id: Uuid) -> MetadataResult<SampleRow> {
        sqlx::query_as::<_, SampleRow>("SELECT * FROM samples WHERE sample_id = $1")
            .bind(sample_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MetadataError::NotFound(format!("sample {sample_id}")))
    }

    async fn create_sample(&self, sample: &NewSample) -> MetadataResult<SampleRow> {
        let tags = sample.tags_json()?;
        let row = sqlx::query_as::<_, SampleRow>(
            r#"
            INSERT INTO samples (
                sample_id, sample_name, sample_url, object_key, bpm,
                musical_key, tags, uploader_id, upload_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(sample.sample_id)
        .bind(&sample.sample_name)
        .bind(&sample.sample_url)
        .bind(&sample.object_key)
        .bind(sample.bpm)
        .bind(&sample.musical_key)
        .bind(&tags)
        .bind(sample.uploader_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("sample {}", sample.sample_id)))?;
        Ok(row)
    }

    async fn delete_sample(&self, sample_id: Uuid) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM samples WHERE sample_id = $1")
            .bind(sample_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("sample {sample_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SavedSampleRepo for PostgresStore {
    async fn list_saved_samples(&self, user_id: Uuid) -> MetadataResult<Vec<SavedSampleRow>> {
        let rows = sqlx::query_as::<_, SavedSampleRow>(
            "SELECT * FROM saved_samples WHERE user_id = $1 ORDER BY save_date, sample_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn save_sample(&self, user_id: Uuid, sample_id: Uuid) -> MetadataResult<SavedSampleRow> {
        let row = sqlx::query_as::<_, SavedSampleRow>(
            "INSERT INTO saved_samples (user_id, sample_id, save_date) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(sample_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("sample {sample_id} already saved by {user_id}")))?;
        Ok(row)
    }
}

#[async_trait]
impl TokenRepo for PostgresStore {
    async fn create_token(&self, token: &TokenRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (
                token_id, user_id, token_hash, expires_at,
                revoked_at, created_at, last_used_at, description
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(token.token_id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(token.created_at)
        .bind(token.last_used_at)
        .bind(&token.description)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("token {}", token.token_id)))?;
        Ok(())
    }

    async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>> {
        let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
        sqlx::query("UPDATE tokens SET last_used_at = $1 WHERE token_id = $2")
            .bind(used_at)
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_token(&self, token_id: Uuid, revoked_at: OffsetDateTime) -> MetadataResult<()> {
        let result = sqlx::query(
            "UPDATE tokens SET revoked_at = $1 WHERE token_id = $2 AND revoked_at IS NULL",
        )
        .bind(revoked_at)
        .bind(token_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("active token {token_id}")));
        }
        Ok(())
    }
}
