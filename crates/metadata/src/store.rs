//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{SampleRepo, SavedSampleRepo, TokenRepo, UserRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    UserRepo + SampleRepo + SavedSampleRepo + TokenRepo + Send + Sync
{
    /// Create the schema if it does not exist.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;

    /// Close the connection pool. Further calls fail.
    async fn close(&self);
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open (creating if needed) a SQLite database at `path`.
    ///
    /// `:memory:` opens a private in-memory database that lives as long as
    /// the store.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let in_memory = path.as_os_str() == ":memory:";

        let opts = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        }
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

        // One connection: SQLite serializes writers anyway, and an in-memory
        // database exists only on the connection that created it.
        let mut pool_opts = SqlitePoolOptions::new().max_connections(1);
        if in_memory {
            pool_opts = pool_opts.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_opts.connect_with(opts).await?;

        let query_timeout = Duration::from_secs(query_timeout_secs.unwrap_or(60));
        let store = Self {
            pool,
            query_timeout,
        };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            query_timeout_secs = query_timeout.as_secs(),
            "Opened SQLite metadata store"
        );

        Ok(store)
    }

    /// Log queries that run past the advisory timeout. SQLite cannot cancel
    /// a running statement, so this only reports.
    async fn timed<T, F>(&self, op: &'static str, fut: F) -> MetadataResult<T>
    where
        F: std::future::Future<Output = MetadataResult<T>>,
    {
        let started = std::time::Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed();
        if elapsed > self.query_timeout {
            tracing::warn!(
                op,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_secs = self.query_timeout.as_secs(),
                "SQLite query exceeded advisory timeout"
            );
        }
        result
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
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

mod sqlite_impl {
    use super::*;
    use crate::error::map_insert_error;
    use crate::models::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[async_trait]
    impl UserRepo for SqliteStore {
        async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO users (user_id, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
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
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn get_user_by_username(&self, username: &str) -> MetadataResult<Option<UserRow>> {
            let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn delete_user(&self, user_id: Uuid) -> MetadataResult<()> {
            let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
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
    impl SampleRepo for SqliteStore {
        async fn list_samples(&self) -> MetadataResult<Vec<SampleRow>> {
            self.timed("list_samples", async {
                let rows = sqlx::query_as::<_, SampleRow>(
                    "SELECT * FROM samples ORDER BY upload_date DESC, sample_id",
                )
                .fetch_all(&self.pool)
                .await?;
                Ok::<_, MetadataError>(rows)
            })
            .await
        }

        async fn get_sample(&self, sample_id: Uuid) -> MetadataResult<SampleRow> {
            sqlx::query_as::<_, SampleRow>("SELECT * FROM samples WHERE sample_id = ?")
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
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
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
            let result = sqlx::query("DELETE FROM samples WHERE sample_id = ?")
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
    impl SavedSampleRepo for SqliteStore {
        async fn list_saved_samples(&self, user_id: Uuid) -> MetadataResult<Vec<SavedSampleRow>> {
            let rows = sqlx::query_as::<_, SavedSampleRow>(
                "SELECT * FROM saved_samples WHERE user_id = ? ORDER BY save_date, sample_id",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }

        async fn save_sample(
            &self,
            user_id: Uuid,
            sample_id: Uuid,
        ) -> MetadataResult<SavedSampleRow> {
            let row = sqlx::query_as::<_, SavedSampleRow>(
                "INSERT INTO saved_samples (user_id, sample_id, save_date) VALUES (?, ?, ?) RETURNING *",
            )
            .bind(user_id)
            .bind(sample_id)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_insert_error(e, || format!("sample {sample_id} already saved by {user_id}"))
            })?;
            Ok(row)
        }
    }

    #[async_trait]
    impl TokenRepo for SqliteStore {
        async fn create_token(&self, token: &TokenRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO tokens (
                    token_id, user_id, token_hash, expires_at,
                    revoked_at, created_at, last_used_at, description
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
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
            let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
            sqlx::query("UPDATE tokens SET last_used_at = ? WHERE token_id = ?")
                .bind(used_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn revoke_token(
            &self,
            token_id: Uuid,
            revoked_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query(
                "UPDATE tokens SET revoked_at = ? WHERE token_id = ? AND revoked_at IS NULL",
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
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id BLOB PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS samples (
    sample_id BLOB PRIMARY KEY,
    sample_name TEXT NOT NULL,
    sample_url TEXT NOT NULL,
    object_key TEXT NOT NULL,
    bpm INTEGER CHECK (bpm IS NULL OR bpm >= 0),
    musical_key TEXT CHECK (musical_key IS NULL OR musical_key IN (
        'C', 'C#', 'Db', 'D', 'D#', 'Eb', 'E', 'F', 'F#', 'Gb', 'G',
        'G#', 'Ab', 'A', 'A#', 'Bb', 'B', 'Cm', 'C#m', 'Dbm', 'Dm',
        'D#m', 'Ebm', 'Em', 'Fm', 'F#m', 'Gbm', 'Gm', 'G#m', 'Abm',
        'Am', 'A#m', 'Bbm', 'Bm'
    )),
    tags TEXT NOT NULL DEFAULT '[]',
    uploader_id BLOB REFERENCES users(user_id) ON DELETE SET NULL,
    upload_date TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_samples_uploader ON samples(uploader_id);
CREATE INDEX IF NOT EXISTS idx_samples_upload_date ON samples(upload_date);

CREATE TABLE IF NOT EXISTS saved_samples (
    user_id BLOB NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    sample_id BLOB NOT NULL REFERENCES samples(sample_id) ON DELETE CASCADE,
    save_date TEXT NOT NULL,
    PRIMARY KEY (user_id, sample_id)
);
CREATE INDEX IF NOT EXISTS idx_saved_samples_sample ON saved_samples(sample_id);

CREATE TABLE IF NOT EXISTS tokens (
    token_id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    token_hash TEXT NOT NULL UNIQUE,
    expires_at TEXT,
    revoked_at TEXT,
    created_at TEXT NOT NULL,
    last_used_at TEXT,
    description TEXT
);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
"#;
