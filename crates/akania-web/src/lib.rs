use std::sync::Arc;

use akania_core::config::AppConfig;
use akania_core::error::Result;
use akania_core::search::SearchBackend;

mod fetch;
mod serpapi;
mod tavily;

pub use fetch::{html_to_text, HttpFetcher};
pub use serpapi::SerpApiBackend;
pub use tavily::TavilyBackend;

/// Builds the search backends whose credentials are configured, in
/// priority order. Backends that fail to initialize are left out.
pub fn search_backends(config: &AppConfig) -> Vec<Arc<dyn SearchBackend>> {
    let timeout = config.http_timeout();
    let mut backends: Vec<Arc<dyn SearchBackend>> = Vec::new();

    for backend_config in config.search_backends() {
        let built: Result<Arc<dyn SearchBackend>> = match backend_config.name.as_str() {
            "tavily" => TavilyBackend::new(&backend_config, timeout)
                .map(|b| Arc::new(b) as Arc<dyn SearchBackend>),
            "serpapi" => SerpApiBackend::new(&backend_config, timeout)
                .map(|b| Arc::new(b) as Arc<dyn SearchBackend>),
            other => {
                tracing::warn!(backend = other, "Unknown search backend in configuration");
                continue;
            }
        };

        match built {
            Ok(backend) => backends.push(backend),
            Err(e) => {
                tracing::warn!(backend = %backend_config.name, error = %e, "Search backend failed to initialize");
            }
        }
    }

    backends
}
