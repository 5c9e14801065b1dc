use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use akania_core::error::{AkaniaError, Result};
use akania_core::fetch::{FetchedDocument, Fetcher};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text never belongs in the extracted page content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

/// Fetches pages over HTTP and reduces them to readable text.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_with(client: &Client, url: &str) -> Result<FetchedDocument> {
        let fetch_error = |message: String| AkaniaError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(format!("Failed to read response body: {e}")))?;

        let (title, text) = if is_html {
            html_to_text(&body)
        } else {
            (None, body.trim().to_string())
        };

        debug!(url = %url, text_len = text.len(), "Fetched page");

        let mut document = FetchedDocument::new(url, text);
        document.title = title;
        Ok(document)
    }
}

/// Page title plus the visible text of `<body>`, one text run per line.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    (title, lines.join("\n"))
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_one(&self, url: &str) -> Result<FetchedDocument> {
        Self::fetch_with(&self.client, url).await
    }

    /// Fetches concurrently; the result keeps input order.
    #[instrument(skip(self, urls), name = "http_fetch", fields(count = urls.len()))]
    async fn fetch(&self, urls: &[String]) -> Vec<FetchedDocument> {
        let mut join_set = JoinSet::new();

        for (i, url) in urls.iter().enumerate() {
            let client = self.client.clone();
            let url = url.clone();
            join_set.spawn(async move { (i, Self::fetch_with(&client, &url).await) });
        }

        let mut fetched = Vec::with_capacity(urls.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((i, Ok(document))) => fetched.push((i, document)),
                Ok((i, Err(e))) => {
                    warn!(url = %urls[i], error = %e, "Skipping URL that failed to fetch");
                }
                Err(join_err) => {
                    warn!(error = %join_err, "Fetch task panicked");
                }
            }
        }

        fetched.sort_by_key(|(i, _)| *i);
        info!(requested = urls.len(), fetched = fetched.len(), "Fetch complete");
        fetched.into_iter().map(|(_, document)| document).collect()
    }
}
