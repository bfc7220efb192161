//! Metadata store test utilities.

use sampleit_metadata::{
    MetadataError, MetadataResult, MetadataStore, NewSample, PostgresStore, SqliteStore, UserRow,
};
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stable prefix for Docker/container startup failures in Postgres test setup.
pub const POSTGRES_CONTAINER_START_ERR_PREFIX: &str = "postgres-container-start:";

/// A file-backed SQLite store that cleans up on drop.
#[allow(dead_code)]
pub struct TestMetadata {
    pub store: Arc<dyn MetadataStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestMetadata {
    pub async fn new() -> MetadataResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let store = SqliteStore::new(temp_dir.path().join("test.db"), None).await?;

        Ok(Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        })
    }

    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.store.clone()
    }
}

/// PostgreSQL test metadata store wrapper that manages a testcontainer.
#[allow(dead_code)]
pub struct PostgresTestMetadata {
    pub store: Arc<dyn MetadataStore>,
    _container: ContainerAsync<Postgres>,
}

#[allow(dead_code)]
impl PostgresTestMetadata {
    pub async fn new() -> MetadataResult<Self> {
        let container = Postgres::default()
            .with_tag("15-alpine")
            .start()
            .await
            .map_err(|e| {
                MetadataError::Internal(format!(
                    "{POSTGRES_CONTAINER_START_ERR_PREFIX} Failed to start PostgreSQL container: {e}"
                ))
            })?;

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        // Default credentials from testcontainers-modules postgres
        let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");
        let store = PostgresStore::from_url(&url, 5, None).await?;

        Ok(Self {
            store: Arc::new(store),
            _container: container,
        })
    }

    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.store.clone()
    }
}

/// Run a test against both SQLite and PostgreSQL backends.
///
/// PostgreSQL needs Docker; set `SKIP_POSTGRES_TESTS` to skip it.
#[allow(dead_code)]
pub async fn run_metadata_test_both<F, Fut>(test_fn: F)
where
    F: Fn(Arc<dyn MetadataStore>) -> Fut + Clone,
    Fut: std::future::Future<Output = ()>,
{
    let sqlite = TestMetadata::new()
        .await
        .expect("Failed to create SQLite test metadata");
    test_fn.clone()(sqlite.store()).await;

    if std::env::var("SKIP_POSTGRES_TESTS").is_err() {
        match PostgresTestMetadata::new().await {
            Ok(postgres) => test_fn(postgres.store()).await,
            Err(err) => eprintln!("Skipping PostgreSQL metadata tests: {err}"),
        }
    }
}

/// Insert a user with a throwaway credential.
#[allow(dead_code)]
pub async fn seed_user(store: &Arc<dyn MetadataStore>, username: &str) -> UserRow {
    let user = UserRow {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: "unused".to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    store.create_user(&user).await.expect("Failed to create user");
    user
}

/// Values for a sample insert with sensible defaults.
#[allow(dead_code)]
pub fn new_sample(name: &str, uploader_id: Option<Uuid>) -> NewSample {
    let sample_id = Uuid::new_v4();
    let object_key = format!("samples/{sample_id}-{name}");
    NewSample {
        sample_id,
        sample_name: name.to_string(),
        sample_url: format!("/files/{object_key}"),
        object_key,
        bpm: None,
        musical_key: None,
        tags: Vec::new(),
        uploader_id,
    }
}
