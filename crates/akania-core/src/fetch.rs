use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Text retrieved from one URL. Only successful fetches become documents;
/// the text may still be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedDocument {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedDocument {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            text: text.into(),
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_one(&self, url: &str) -> Result<FetchedDocument>;

    /// Fetches every URL in order, skipping (and logging) failures. Never
    /// fails as a whole.
    async fn fetch(&self, urls: &[String]) -> Vec<FetchedDocument> {
        let mut documents = Vec::with_capacity(urls.len());
        for url in urls {
            match self.fetch_one(url).await {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Skipping URL that failed to fetch");
                }
            }
        }
        documents
    }
}
