use std::sync::Arc;

use akania_core::config::AppConfig;
use akania_core::error::Result;
use akania_core::store::ProfileStore;
use akania_extraction::LlmExtractionEngine;
use akania_pipeline::{DiscoveryEngine, DiscoveryOptions, PipelineOptions, ProfilePipeline};
use akania_store::FileProfileStore;
use akania_web::HttpFetcher;

/// Everything a command needs, wired from configuration.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<FileProfileStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(FileProfileStore::from_config(&config));
        Self { config, store }
    }

    /// Fails with a configuration error before any network call when a
    /// required credential is missing.
    pub fn build_pipeline(&self) -> Result<ProfilePipeline> {
        self.config.validate()?;

        let backends = akania_web::search_backends(&self.config);
        let discovery = DiscoveryEngine::new(
            backends,
            DiscoveryOptions {
                backend_timeout: self.config.http_timeout(),
                ..Default::default()
            },
        );
        tracing::info!(backends = ?discovery.backend_names(), "Search backends enabled");

        let fetcher = Arc::new(HttpFetcher::new(self.config.http_timeout())?);
        let extractor = Arc::new(LlmExtractionEngine::new(&self.config)?);

        Ok(ProfilePipeline::new(
            discovery,
            fetcher,
            extractor,
            self.store.clone() as Arc<dyn ProfileStore>,
            PipelineOptions::from_config(&self.config),
        ))
    }
}
