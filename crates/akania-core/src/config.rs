use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AkaniaError, Result};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_MAX_URLS: usize = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// One search backend enabled at process start. Backends are listed in
/// priority order: the first is queried for every discovery, later ones only
/// to top up a short result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBackendConfig {
    pub name: String,
    pub api_key: String,
    pub max_results: usize,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub anthropic_api_key: String,
    pub anthropic_api_url: Option<String>,
    pub model: String,
    pub tavily_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub data_dir: PathBuf,
    pub max_urls: usize,
    pub http_timeout_secs: u64,
    pub batch_concurrency: usize,
}

/// Per-component readiness, reported by `akania --setup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetupReport {
    pub llm_ready: bool,
    pub tavily_ready: bool,
    pub serpapi_ready: bool,
    pub website_discovery_ready: bool,
    pub data_dir_writable: bool,
}

impl SetupReport {
    pub fn is_ready(&self) -> bool {
        self.llm_ready && self.website_discovery_ready
    }

    pub fn components(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("llm_ready", self.llm_ready),
            ("tavily_ready", self.tavily_ready),
            ("serpapi_ready", self.serpapi_ready),
            ("website_discovery_ready", self.website_discovery_ready),
            ("data_dir_writable", self.data_dir_writable),
        ]
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            anthropic_api_url: non_empty(std::env::var("ANTHROPIC_API_URL").ok()),
            model: std::env::var("AKANIA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            tavily_api_key: non_empty(std::env::var("TAVILY_API_KEY").ok()),
            serpapi_api_key: non_empty(std::env::var("SERPAPI_API_KEY").ok()),
            data_dir: std::env::var("AKANIA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            max_urls: std::env::var("AKANIA_MAX_URLS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_MAX_URLS),
            http_timeout_secs: std::env::var("AKANIA_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            batch_concurrency: std::env::var("AKANIA_BATCH_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(1),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Search backends with credentials present, in priority order
    /// (Tavily first, SerpAPI second).
    pub fn search_backends(&self) -> Vec<SearchBackendConfig> {
        let mut backends = Vec::new();
        if let Some(key) = &self.tavily_api_key {
            backends.push(SearchBackendConfig {
                name: "tavily".into(),
                api_key: key.clone(),
                max_results: 5,
                topic: "general".into(),
            });
        }
        if let Some(key) = &self.serpapi_api_key {
            backends.push(SearchBackendConfig {
                name: "serpapi".into(),
                api_key: key.clone(),
                max_results: 10,
                topic: "general".into(),
            });
        }
        backends
    }

    pub fn has_completion_credentials(&self) -> bool {
        !self.anthropic_api_key.trim().is_empty()
    }

    /// Fails when extraction could not possibly run: no completion credential
    /// or no search backend at all.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !self.has_completion_credentials() {
            missing.push("ANTHROPIC_API_KEY");
        }
        if self.search_backends().is_empty() {
            missing.push("TAVILY_API_KEY or SERPAPI_API_KEY");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AkaniaError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn readiness(&self) -> SetupReport {
        let tavily_ready = self.tavily_api_key.is_some();
        let serpapi_ready = self.serpapi_api_key.is_some();
        SetupReport {
            llm_ready: self.has_completion_credentials(),
            tavily_ready,
            serpapi_ready,
            website_discovery_ready: tavily_ready || serpapi_ready,
            data_dir_writable: data_dir_writable(&self.data_dir),
        }
    }
}

fn data_dir_writable(dir: &std::path::Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    std::fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            anthropic_api_key: "sk-test".into(),
            anthropic_api_url: None,
            model: DEFAULT_MODEL.into(),
            tavily_api_key: Some("tvly".into()),
            serpapi_api_key: None,
            data_dir: std::env::temp_dir(),
            max_urls: DEFAULT_MAX_URLS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            batch_concurrency: 1,
        }
    }

    #[test]
    fn test_search_backends_priority_order() {
        let mut cfg = config();
        cfg.serpapi_api_key = Some("serp".into());
        let names: Vec<_> = cfg.search_backends().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["tavily", "serpapi"]);
    }

    #[test]
    fn test_single_backend_is_valid() {
        let mut cfg = config();
        cfg.tavily_api_key = None;
        cfg.serpapi_api_key = Some("serp".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_everything() {
        let mut cfg = config();
        cfg.anthropic_api_key = String::new();
        cfg.tavily_api_key = None;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("ANTHROPIC_API_KEY"));
        assert!(err.contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_readiness() {
        let report = config().readiness();
        assert!(report.llm_ready);
        assert!(report.tavily_ready);
        assert!(!report.serpapi_ready);
        assert!(report.website_discovery_ready);
        assert!(report.is_ready());
    }
}
