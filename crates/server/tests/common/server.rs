//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sampleit_core::config::{AppConfig, MetadataConfig, StorageConfig};
use sampleit_metadata::{MetadataStore, SqliteStore};
use sampleit_server::{AppState, create_router};
use sampleit_storage::{FilesystemBackend, ObjectStore};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

/// Response captured from the router.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        if self.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.body).unwrap_or(Value::Null)
        }
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage and in-memory SQLite.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage_path = temp_dir.path().join("storage");
        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );

        let mut config = test_config(&storage_path);
        modifier(&mut config);

        Self::build(config, storage, temp_dir).await
    }

    /// Create a test server over a caller-supplied object store.
    pub async fn with_storage(storage: Arc<dyn ObjectStore>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = test_config(&temp_dir.path().join("storage"));
        Self::build(config, storage, temp_dir).await
    }

    async fn build(config: AppConfig, storage: Arc<dyn ObjectStore>, temp_dir: TempDir) -> Self {
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(":memory:", None)
                .await
                .expect("Failed to create metadata store"),
        );

        let state = AppState::new(config, storage, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Send a prepared request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a JSON (or empty) request, optionally with a bearer token.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let response = self.send(builder.body(body).unwrap()).await;
        (response.status, response.json())
    }

    /// Send a multipart upload to `POST /samples`.
    pub async fn upload(
        &self,
        form: &super::fixtures::MultipartForm,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/samples")
            .header("Content-Type", form.content_type());
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let response = self
            .send(builder.body(Body::from(form.body())).unwrap())
            .await;
        (response.status, response.json())
    }

    /// Register a user and return `(user_id, token)`.
    pub async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .json(
                "POST",
                "/users",
                Some(serde_json::json!({
                    "username": username,
                    "password": "correct horse battery",
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["user_id"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}

fn test_config(storage_path: &std::path::Path) -> AppConfig {
    AppConfig {
        storage: StorageConfig::Filesystem {
            path: storage_path.to_path_buf(),
            public_url: None,
        },
        metadata: MetadataConfig::Sqlite {
            path: ":memory:".into(),
            query_timeout_secs: None,
        },
        ..AppConfig::for_testing()
    }
}
