use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use akania_core::query::CompanyQuery;
use akania_core::search::{SearchBackend, SearchRequest};

use crate::timed;

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Put URLs mentioning a word of the company name ahead of the rest.
    pub rank_by_name: bool,
    pub topic: String,
    /// Upper bound on each backend call.
    pub backend_timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            rank_by_name: true,
            topic: "general".to_string(),
            backend_timeout: Duration::from_secs(30),
        }
    }
}

/// Finds candidate pages for a company across the configured search
/// backends, queried in priority order.
pub struct DiscoveryEngine {
    backends: Vec<Arc<dyn SearchBackend>>,
    options: DiscoveryOptions,
}

impl DiscoveryEngine {
    pub fn new(backends: Vec<Arc<dyn SearchBackend>>, options: DiscoveryOptions) -> Self {
        Self { backends, options }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Website discovery for `company` using its primary query.
    pub async fn discover(&self, company: &CompanyQuery, max_results: usize) -> Vec<String> {
        self.discover_with_query(company, &company.primary_search_query(), max_results)
            .await
    }

    /// Runs `search_query` against the first backend and tops up from the
    /// following ones while fewer than `max_results` unique URLs are known.
    /// A failing backend contributes nothing.
    pub async fn discover_with_query(
        &self,
        company: &CompanyQuery,
        search_query: &str,
        max_results: usize,
    ) -> Vec<String> {
        if max_results == 0 {
            return Vec::new();
        }

        let request = SearchRequest {
            query: search_query.to_string(),
            max_results,
            topic: self.options.topic.clone(),
        };

        let mut collected: Vec<String> = Vec::new();
        for (priority, backend) in self.backends.iter().enumerate() {
            if priority > 0 && unique_count(&collected) >= max_results {
                break;
            }

            match timed(self.options.backend_timeout, backend.search(&request)).await {
                Ok(results) => {
                    debug!(
                        backend = backend.name(),
                        results = results.len(),
                        "Search backend returned results"
                    );
                    collected.extend(
                        results
                            .into_iter()
                            .map(|r| r.url.trim().to_string())
                            .filter(|u| !u.is_empty()),
                    );
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Search backend failed, continuing without it");
                }
            }
        }

        let mut urls = dedup_preserving_order(collected);
        if self.options.rank_by_name {
            urls = rank_by_name(urls, &company.name_tokens());
        }
        urls.truncate(max_results);

        info!(
            company = %company,
            query = %search_query,
            urls = urls.len(),
            "Discovery complete"
        );
        urls
    }
}

fn unique_count(urls: &[String]) -> usize {
    urls.iter().collect::<HashSet<_>>().len()
}

pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

/// Stable partition: URLs containing any of `tokens` (case-insensitive)
/// first, then the others, each group in its original order.
pub fn rank_by_name(urls: Vec<String>, tokens: &[String]) -> Vec<String> {
    if tokens.is_empty() {
        return urls;
    }
    let (relevant, other): (Vec<String>, Vec<String>) = urls.into_iter().partition(|url| {
        let lowered = url.to_lowercase();
        tokens.iter().any(|t| lowered.contains(&t.to_lowercase()))
    });
    relevant.into_iter().chain(other).collect()
}
