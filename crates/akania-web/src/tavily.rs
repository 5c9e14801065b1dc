use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use akania_core::config::SearchBackendConfig;
use akania_core::error::{AkaniaError, Result};
use akania_core::search::{SearchBackend, SearchRequest, SearchResult};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    topic: &'a str,
    max_results: usize,
}

/// Primary search backend.
pub struct TavilyBackend {
    client: Client,
    api_key: String,
    endpoint: String,
    max_results: usize,
    topic: String,
}

impl TavilyBackend {
    pub fn new(config: &SearchBackendConfig, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("akania-profiler/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
            max_results: config.max_results,
            topic: config.topic.clone(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn search_error(message: String) -> AkaniaError {
        error!(%message);
        AkaniaError::Search {
            backend: "tavily".to_string(),
            message,
        }
    }

    /// Pulls `results[].url` out of an arbitrary Tavily payload. Entries
    /// without a usable URL are skipped; a payload with no `results` array
    /// is an error.
    fn parse_results(payload: &Value) -> Result<Vec<SearchResult>> {
        let entries = payload
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Self::search_error("response has no `results` array".to_string())
            })?;

        let results = entries
            .iter()
            .filter_map(|entry| {
                let url = entry.get("url").and_then(Value::as_str).map(str::trim);
                match url {
                    Some(url) if !url.is_empty() => Some(SearchResult {
                        url: url.to_string(),
                        title: entry.get("title").and_then(Value::as_str).map(String::from),
                        snippet: entry
                            .get("content")
                            .and_then(Value::as_str)
                            .map(String::from),
                    }),
                    _ => {
                        warn!("Skipping Tavily result without url");
                        None
                    }
                }
            })
            .collect();

        Ok(results)
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &str {
        "tavily"
    }

    #[instrument(skip(self, request), name = "tavily_search", fields(query = %request.query))]
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let body = TavilyRequest {
            api_key: &self.api_key,
            query: &request.query,
            topic: if request.topic.is_empty() {
                self.topic.as_str()
            } else {
                request.topic.as_str()
            },
            max_results: request.max_results.min(self.max_results).max(1),
        };

        debug!(max_results = body.max_results, topic = body.topic, "Querying Tavily");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::search_error(format!("HTTP request to Tavily failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::search_error(format!(
                "Tavily API returned HTTP {}: {}",
                status,
                text.chars().take(500).collect::<String>()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Self::search_error(format!("Failed to parse Tavily response: {e}")))?;

        let results = Self::parse_results(&payload)?;
        info!(results = results.len(), "Tavily search complete");
        Ok(results)
    }
}
