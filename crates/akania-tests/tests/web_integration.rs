use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use akania_core::config::{AppConfig, SearchBackendConfig};
use akania_core::error::Result;
use akania_core::fetch::{FetchedDocument, Fetcher};
use akania_core::query::CompanyQuery;
use akania_core::search::{SearchBackend, SearchRequest, SearchResult};
use akania_core::store::ProfileStore;
use akania_extraction::{CompletionService, LlmExtractionEngine};
use akania_pipeline::{DiscoveryEngine, DiscoveryOptions, PipelineOptions, ProfilePipeline};
use akania_store::{FileProfileStore, ProfileSnapshot};
use akania_web::{search_backends, HttpFetcher, SerpApiBackend, TavilyBackend};

/// Nothing listens on the discard port.
const UNREACHABLE: &str = "http://127.0.0.1:9/search";

fn config(tavily: Option<&str>, serpapi: Option<&str>) -> AppConfig {
    AppConfig {
        anthropic_api_key: "sk-test".into(),
        anthropic_api_url: Some("http://127.0.0.1:9/v1/messages".into()),
        model: "test-model".into(),
        tavily_api_key: tavily.map(String::from),
        serpapi_api_key: serpapi.map(String::from),
        data_dir: PathBuf::from("data"),
        max_urls: 3,
        http_timeout_secs: 2,
        batch_concurrency: 1,
    }
}

fn backend_config(name: &str) -> SearchBackendConfig {
    SearchBackendConfig {
        name: name.into(),
        api_key: "test-key".into(),
        max_results: 5,
        topic: "general".into(),
    }
}

// ---------------------------------------------------------------------------
// Backend registry
// ---------------------------------------------------------------------------

#[test]
fn registry_orders_tavily_before_serpapi() {
    let backends = search_backends(&config(Some("tvly"), Some("serp")));
    let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
    assert_eq!(names, vec!["tavily", "serpapi"]);
}

#[test]
fn registry_is_empty_without_search_credentials() {
    assert!(search_backends(&config(None, None)).is_empty());
}

// ---------------------------------------------------------------------------
// Degradation against unreachable services
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_backends_degrade_to_no_urls() {
    let timeout = Duration::from_secs(2);
    let tavily = TavilyBackend::new(&backend_config("tavily"), timeout)
        .unwrap()
        .with_endpoint(UNREACHABLE);
    let serpapi = SerpApiBackend::new(&backend_config("serpapi"), timeout)
        .unwrap()
        .with_endpoint(UNREACHABLE);

    let backends: Vec<Arc<dyn SearchBackend>> = vec![Arc::new(tavily), Arc::new(serpapi)];
    let engine = DiscoveryEngine::new(backends, DiscoveryOptions::default());

    let urls = engine.discover(&CompanyQuery::new("Paystack (Nigeria)"), 3).await;
    assert!(urls.is_empty());
}

#[tokio::test]
async fn unreachable_pages_are_skipped_by_http_fetcher() {
    let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
    let documents = fetcher
        .fetch(&[
            "http://127.0.0.1:9/a".to_string(),
            "http://127.0.0.1:9/b".to_string(),
        ])
        .await;
    assert!(documents.is_empty());
}

// ---------------------------------------------------------------------------
// Discovery -> fetch -> LLM parsing -> store, with canned collaborators
// ---------------------------------------------------------------------------

struct OneHit;

#[async_trait]
impl SearchBackend for OneHit {
    fn name(&self) -> &str {
        "one-hit"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<SearchResult>> {
        Ok(vec![SearchResult::new("https://paystack.com/about")])
    }
}

struct AboutPage;

#[async_trait]
impl Fetcher for AboutPage {
    async fn fetch_one(&self, url: &str) -> Result<FetchedDocument> {
        Ok(FetchedDocument::new(
            url,
            "Paystack helps businesses in Nigeria and Ghana accept payments.",
        ))
    }
}

struct FencedJson {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionService for FencedJson {
    async fn complete(&self, _system: &str, user: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(user.to_string());
        Ok(r#"```json
{
  "company_name": "Paystack",
  "countries": ["Nigeria", "Ghana", "Nigeria"],
  "sector": "Payments",
  "business_description": "Paystack helps businesses accept payments.",
  "key_people": [{"name": "Shola Akinlade", "title": "CEO"}, {"name": "Anonymous"}],
  "transactions": "N/A"
}
```"#
            .to_string())
    }
}

#[tokio::test]
async fn end_to_end_profile_lands_in_store() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(FileProfileStore::new(tmp.path()));
    let completion = Arc::new(FencedJson {
        prompts: Mutex::new(Vec::new()),
    });

    let pipeline = ProfilePipeline::new(
        DiscoveryEngine::new(vec![Arc::new(OneHit)], DiscoveryOptions::default()),
        Arc::new(AboutPage),
        Arc::new(LlmExtractionEngine::with_completion(completion.clone())),
        store.clone(),
        PipelineOptions::default(),
    );

    let outcome = pipeline.run(&CompanyQuery::new("Paystack (Nigeria)")).await.unwrap();
    assert!(outcome.is_success());

    let profile = outcome.profile.unwrap();
    assert_eq!(profile.countries, vec!["Nigeria", "Ghana"]);
    assert_eq!(profile.sector, vec!["Payments"]);
    assert_eq!(profile.key_people.len(), 1);
    assert!(profile.transactions.is_none());
    assert_eq!(profile.source_urls, vec!["https://paystack.com/about"]);

    let prompts = completion.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("accept payments"));

    let snapshot = ProfileSnapshot::load(&*store).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.find("paystack").is_some());
    assert_eq!(store.load_all().await.unwrap()[0]["company_name"], "Paystack");
}
