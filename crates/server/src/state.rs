//! Application state shared across handlers.

use sampleit_analysis::{AudioAnalyzer, SpectralAnalyzer};
use sampleit_core::config::AppConfig;
use sampleit_metadata::MetadataStore;
use sampleit_storage::{ObjectStore, SampleStorage};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Sample upload gateway over the object store.
    pub gateway: SampleStorage,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Feature extractor, present only when analysis is enabled.
    pub analyzer: Option<Arc<dyn AudioAnalyzer>>,
}

impl AppState {
    /// Create a new application state. The spectral analyzer is installed
    /// when `analysis.enabled` is set.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let analyzer = config.analysis.enabled.then(|| {
            Arc::new(SpectralAnalyzer::from_config(&config.analysis)) as Arc<dyn AudioAnalyzer>
        });

        Self {
            config: Arc::new(config),
            gateway: SampleStorage::new(storage),
            metadata,
            analyzer,
        }
    }

    /// The object store behind the gateway.
    pub fn storage(&self) -> &Arc<dyn ObjectStore> {
        self.gateway.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampleit_metadata::SqliteStore;
    use sampleit_storage::FilesystemBackend;
    use tempfile::tempdir;

    async fn build_state(config: AppConfig) -> (tempfile::TempDir, AppState) {
        let temp = tempdir().unwrap();
        let storage: Arc<dyn ObjectStore> =
            Arc::new(FilesystemBackend::new(temp.path()).await.unwrap());
        let metadata: Arc<dyn MetadataStore> =
            Arc::new(SqliteStore::new(":memory:", None).await.unwrap());
        (temp, AppState::new(config, storage, metadata))
    }

    #[tokio::test]
    async fn analyzer_absent_by_default() {
        let (_temp, state) = build_state(AppConfig::for_testing()).await;
        assert!(state.analyzer.is_none());
        assert_eq!(state.storage().backend_name(), "filesystem");
    }

    #[tokio::test]
    async fn analyzer_installed_when_enabled() {
        let mut config = AppConfig::for_testing();
        config.analysis.enabled = true;
        let (_temp, state) = build_state(config).await;
        assert!(state.analyzer.is_some());
    }
}
