use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One ranked hit from a search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    pub topic: String,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Runs one query. An `Err` means the backend failed; the discovery
    /// engine logs it and carries on without this backend's results.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;
}

/// Advisory check callers may apply before fetching: non-empty with an
/// http or https scheme.
pub fn is_valid_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }
    match url::Url::parse(candidate) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}
