//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes, which bounds a single upload.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Allow cross-origin requests from any origin (default: true).
    /// The browser frontend is usually served from a different origin.
    #[serde(default = "default_cors_allow_any")]
    pub cors_allow_any: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_cors_allow_any() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            metrics_enabled: default_metrics_enabled(),
            cors_allow_any: default_cors_allow_any(),
        }
    }
}

impl ServerConfig {
    /// Get the request timeout as a std::time::Duration.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes cannot be 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("server.request_timeout_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
        /// Base URL objects are published under. When unset, objects are
        /// served by this API under `/files/`.
        #[serde(default)]
        public_url: Option<String>,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to AWS_ACCESS_KEY_ID env var if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to AWS_SECRET_ACCESS_KEY env var if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        secret_access_key: Option<String>,
        /// Force path-style URLs (e.g., `endpoint/bucket/key` instead of `bucket.endpoint/key`).
        /// Required for MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
        /// Base URL objects are published under (e.g. a CDN). When unset the
        /// bucket's own URL is used.
        #[serde(default)]
        public_url: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/storage"),
            public_url: None,
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::Filesystem { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err("filesystem storage requires a non-empty path".to_string());
                }
                Ok(())
            }
            StorageConfig::S3 {
                bucket,
                access_key_id,
                secret_access_key,
                ..
            } => {
                if bucket.is_empty() {
                    return Err("s3 config requires a non-empty bucket".to_string());
                }
                match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                    (Some(_), Some(_)) | (None, None) => Ok(()),
                    _ => Err(
                        "s3 config requires both access_key_id and secret_access_key when either is set"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database (recommended for testing and small deployments only).
    Sqlite {
        /// Database file path, or `:memory:`.
        path: PathBuf,
        /// Query timeout in seconds (advisory only - SQLite cannot force-cancel queries).
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL (optional if using individual fields).
        /// Takes precedence over individual fields if both are provided.
        url: Option<String>,
        /// Database host (e.g., "localhost" or "db.example.com").
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer SAMPLEIT_METADATA__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds.
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_max_connections() -> u32 {
    10
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(30_000)
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(60)
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MetadataConfig::Sqlite { .. } => Ok(()),
            MetadataConfig::Postgres {
                url,
                host,
                database,
                max_connections,
                ..
            } => {
                if *max_connections == 0 {
                    return Err("postgres max_connections cannot be 0".to_string());
                }
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) => Ok(()),
                    (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(
                        "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                    ),
                    (None, Some(_), None) => Err(
                        "postgres config requires 'database' when using individual fields"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// User account and token configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of issued tokens in seconds. Tokens never expire when unset.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,
    /// Allow self-service registration via `POST /users` (default: true).
    #[serde(default = "default_allow_registration")]
    pub allow_registration: bool,
    /// Reject anonymous uploads (default: false).
    #[serde(default)]
    pub require_auth_for_upload: bool,
}

fn default_allow_registration() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: None,
            allow_registration: default_allow_registration(),
            require_auth_for_upload: false,
        }
    }
}

impl AuthConfig {
    /// Get the token lifetime as a Duration, if tokens expire.
    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl_secs
            .map(|secs| Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
    }

    /// Validate auth configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_ttl_secs == Some(0) {
            return Err("auth.token_ttl_secs cannot be 0; omit it for non-expiring tokens".to_string());
        }
        Ok(())
    }
}

/// Audio analysis configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Estimate BPM and key for uploads that do not supply them (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Only the first N seconds of audio are analyzed.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u32,
}

fn default_max_duration_secs() -> u32 {
    60
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Accounts and tokens.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Audio analysis.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage and SQLite metadata at
    /// their default paths; callers normally override both.
    pub fn for_testing() -> Self {
        Self::default()
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.storage.validate()?;
        self.metadata.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert!(config.metrics_enabled);
        assert!(config.cors_allow_any);
        assert_eq!(config.max_upload_bytes, 100 * 1024 * 1024);
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(300));
    }

    #[test]
    fn test_app_config_deserialize_empty() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.auth.allow_registration);
        assert!(!config.auth.require_auth_for_upload);
        assert!(!config.analysis.enabled);
        assert!(matches!(config.metadata, MetadataConfig::Sqlite { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_config_s3_roundtrip() {
        let config = StorageConfig::S3 {
            bucket: "samples-bucket".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
            region: Some("us-east-1".to_string()),
            prefix: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: true,
            public_url: Some("https://cdn.example.com".to_string()),
        };

        let json = serde_json::to_string(&config).unwrap();
        let decoded: StorageConfig = serde_json::from_str(&json).unwrap();

        match decoded {
            StorageConfig::S3 {
                bucket,
                force_path_style,
                public_url,
                ..
            } => {
                assert_eq!(bucket, "samples-bucket");
                assert!(force_path_style);
                assert_eq!(public_url.as_deref(), Some("https://cdn.example.com"));
            }
            _ => panic!("expected S3 config"),
        }
    }

    #[test]
    fn test_storage_config_s3_validate() {
        let partial: StorageConfig = serde_json::from_str(
            r#"{"type":"s3","bucket":"b","access_key_id":"AK","secret_access_key":null}"#,
        )
        .unwrap();
        assert!(partial.validate().is_err());

        let empty_bucket: StorageConfig =
            serde_json::from_str(r#"{"type":"s3","bucket":""}"#).unwrap();
        assert!(empty_bucket.validate().is_err());

        let ok: StorageConfig =
            serde_json::from_str(r#"{"type":"s3","bucket":"b","endpoint":null}"#).unwrap();
        assert!(ok.validate().is_ok());
        match ok {
            StorageConfig::S3 {
                force_path_style,
                public_url,
                ..
            } => {
                assert!(!force_path_style);
                assert!(public_url.is_none());
            }
            _ => panic!("expected S3 config"),
        }
    }

    #[test]
    fn test_metadata_config_postgres_validate() {
        let url: MetadataConfig =
            serde_json::from_str(r#"{"type":"postgres","url":"postgres://localhost/sampleit"}"#)
                .unwrap();
        assert!(url.validate().is_ok());

        let params: MetadataConfig =
            serde_json::from_str(r#"{"type":"postgres","host":"db","database":"sampleit"}"#)
                .unwrap();
        assert!(params.validate().is_ok());

        let missing_db: MetadataConfig =
            serde_json::from_str(r#"{"type":"postgres","host":"db"}"#).unwrap();
        assert!(missing_db.validate().is_err());

        let nothing: MetadataConfig = serde_json::from_str(r#"{"type":"postgres"}"#).unwrap();
        assert!(nothing.validate().is_err());
    }

    #[test]
    fn test_auth_config_token_ttl() {
        let config = AuthConfig {
            token_ttl_secs: Some(3600),
            ..AuthConfig::default()
        };
        assert_eq!(config.token_ttl(), Some(Duration::hours(1)));
        assert_eq!(AuthConfig::default().token_ttl(), None);

        let zero = AuthConfig {
            token_ttl_secs: Some(0),
            ..AuthConfig::default()
        };
        assert!(zero.validate().is_err());
    }
}
