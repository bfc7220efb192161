//! Metadata store for Sample It.
//!
//! Holds the relational side of the service: user accounts, sample records,
//! saved-sample links and API tokens. Audio bytes live in object storage;
//! rows here only reference them by key and URL.

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{NewSample, SampleRow, SavedSampleRow, TokenRow, UserRow};
pub use postgres::PostgresStore;
pub use store::{MetadataStore, SqliteStore};

use sampleit_core::config::MetadataConfig;
use std::sync::Arc;

/// Open the configured metadata store and bring its schema up to date.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    config.validate().map_err(MetadataError::Config)?;

    let store: Arc<dyn MetadataStore> = match config {
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
        } => Arc::new(SqliteStore::new(path, *query_timeout_secs).await?),
        MetadataConfig::Postgres {
            url: Some(url),
            max_connections,
            statement_timeout_ms,
            ..
        } => {
            tracing::info!("Connecting to PostgreSQL using connection URL");
            Arc::new(PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?)
        }
        MetadataConfig::Postgres {
            host: Some(host),
            database: Some(database),
            port,
            username,
            password,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
            ..
        } => Arc::new(
            PostgresStore::from_params(
                host,
                port.unwrap_or(5432),
                username.as_deref(),
                password.as_deref(),
                database,
                *ssl_mode,
                *max_connections,
                *statement_timeout_ms,
            )
            .await?,
        ),
        MetadataConfig::Postgres { .. } => {
            return Err(MetadataError::Config(
                "postgres config requires either 'url' or 'host' + 'database'".to_string(),
            ));
        }
    };

    Ok(store)
}
