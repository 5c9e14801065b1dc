use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use akania_core::config::SearchBackendConfig;
use akania_core::error::{AkaniaError, Result};
use akania_core::search::{SearchBackend, SearchRequest, SearchResult};

const SERPAPI_SEARCH_URL: &str = "https://serpapi.com/search.json";

/// Secondary search backend (Google results via SerpAPI), used to top up.
pub struct SerpApiBackend {
    client: Client,
    api_key: String,
    endpoint: String,
    max_results: usize,
}

impl SerpApiBackend {
    pub fn new(config: &SearchBackendConfig, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("akania-profiler/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: SERPAPI_SEARCH_URL.to_string(),
            max_results: config.max_results,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn search_error(message: String) -> AkaniaError {
        error!(%message);
        AkaniaError::Search {
            backend: "serpapi".to_string(),
            message,
        }
    }

    /// Reads `organic_results[].link`. SerpAPI reports quota and query
    /// problems in an `error` field with HTTP 200, so that is checked first.
    fn parse_results(payload: &Value) -> Result<Vec<SearchResult>> {
        if let Some(message) = payload.get("error").and_then(Value::as_str) {
            // "no results" is an empty answer, not a failure
            if message.contains("hasn't returned any results") {
                return Ok(Vec::new());
            }
            return Err(Self::search_error(format!("SerpAPI error: {message}")));
        }

        let entries = payload
            .get("organic_results")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Self::search_error("response has no `organic_results` array".to_string())
            })?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let link = entry.get("link").and_then(Value::as_str)?.trim();
                if link.is_empty() {
                    return None;
                }
                Some(SearchResult {
                    url: link.to_string(),
                    title: entry.get("title").and_then(Value::as_str).map(String::from),
                    snippet: entry.get("snippet").and_then(Value::as_str).map(String::from),
                })
            })
            .collect())
    }
}

#[async_trait]
impl SearchBackend for SerpApiBackend {
    fn name(&self) -> &str {
        "serpapi"
    }

    #[instrument(skip(self, request), name = "serpapi_search", fields(query = %request.query))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let num = request.max_results.min(self.max_results).max(1).to_string();
        debug!(num = %num, "Querying SerpAPI");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", request.query.as_str()),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Self::search_error(format!("HTTP request to SerpAPI failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::search_error(format!(
                "SerpAPI returned HTTP {}: {}",
                status,
                text.chars().take(500).collect::<String>()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Self::search_error(format!("Failed to parse SerpAPI response: {e}")))?;

        let results = Self::parse_results(&payload)?;
        info!(results = results.len(), "SerpAPI search complete");
        Ok(results)
    }
}
