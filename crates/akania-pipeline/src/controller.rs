use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use akania_core::config::{AppConfig, DEFAULT_MAX_URLS};
use akania_core::error::Result;
use akania_core::extraction::ExtractionEngine;
use akania_core::fetch::Fetcher;
use akania_core::profile::{is_incomplete, CompanyProfile};
use akania_core::query::CompanyQuery;
use akania_core::search::is_valid_url;
use akania_core::store::ProfileStore;

use crate::discovery::DiscoveryEngine;
use crate::timed;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// URLs fetched and handed to extraction per attempt.
    pub max_urls: usize,
    pub fetch_timeout: Duration,
    pub extraction_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_urls: DEFAULT_MAX_URLS,
            fetch_timeout: Duration::from_secs(60),
            extraction_timeout: Duration::from_secs(120),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = config.http_timeout();
        Self {
            max_urls: config.max_urls,
            fetch_timeout: timeout * 2,
            extraction_timeout: timeout * 4,
        }
    }
}

/// How the final profile was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The first attempt was complete.
    Primary,
    /// The retry was complete and replaced the first attempt.
    RetryReplaced,
    /// Gaps in the first attempt were filled from the retry.
    Merged,
    /// Only the retry produced anything.
    RetryOnly,
    /// The retry produced nothing; the first attempt stands.
    PrimaryOnly,
    /// Neither attempt produced a profile.
    Nothing,
}

#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub query: CompanyQuery,
    pub profile: Option<CompanyProfile>,
    pub resolution: Resolution,
    pub saved: bool,
}

impl ExtractionOutcome {
    /// A named profile was produced and persisted.
    pub fn is_success(&self) -> bool {
        self.saved
    }
}

/// Combines the first attempt with the retry.
///
/// A complete retry replaces the first attempt outright. An incomplete
/// retry only fills the first attempt's empty fields (see
/// [`CompanyProfile::fill_missing_from`]). Without a retry result the first
/// attempt is returned unchanged.
pub fn resolve_attempts(
    primary: Option<CompanyProfile>,
    retry: Option<CompanyProfile>,
) -> (Option<CompanyProfile>, Resolution) {
    match (primary, retry) {
        (_, Some(retry)) if retry.is_complete() => (Some(retry), Resolution::RetryReplaced),
        (Some(mut primary), Some(retry)) => {
            primary.fill_missing_from(&retry);
            (Some(primary), Resolution::Merged)
        }
        (None, Some(retry)) => (Some(retry), Resolution::RetryOnly),
        (Some(primary), None) => (Some(primary), Resolution::PrimaryOnly),
        (None, None) => (None, Resolution::Nothing),
    }
}

/// Drives discovery, fetch and extraction for one company, retries once
/// with a reformulated query when the result is incomplete, and persists
/// the final profile.
pub struct ProfilePipeline {
    discovery: DiscoveryEngine,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn ExtractionEngine>,
    store: Arc<dyn ProfileStore>,
    options: PipelineOptions,
}

impl ProfilePipeline {
    pub fn new(
        discovery: DiscoveryEngine,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn ExtractionEngine>,
        store: Arc<dyn ProfileStore>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            discovery,
            fetcher,
            extractor,
            store,
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // One attempt: discover -> fetch -> extract
    // ------------------------------------------------------------------

    /// `None` means "no data": nothing discovered, nothing fetched, or the
    /// completion service failed.
    async fn attempt(&self, company: &CompanyQuery, search_query: &str) -> Option<CompanyProfile> {
        let discovered = self
            .discovery
            .discover_with_query(company, search_query, self.options.max_urls)
            .await;

        let urls: Vec<String> = discovered
            .into_iter()
            .filter(|url| {
                let valid = is_valid_url(url);
                if !valid {
                    debug!(url = %url, "Dropping non-http(s) URL before fetch");
                }
                valid
            })
            .take(self.options.max_urls)
            .collect();

        if urls.is_empty() {
            info!(company = %company, query = %search_query, "No URLs discovered");
            return None;
        }

        let documents = match tokio::time::timeout(
            self.options.fetch_timeout,
            self.fetcher.fetch(&urls),
        )
        .await
        {
            Ok(documents) => documents,
            Err(_) => {
                warn!(company = %company, "Fetching timed out");
                Vec::new()
            }
        };

        if documents.is_empty() {
            info!(company = %company, urls = urls.len(), "No documents could be fetched");
            return None;
        }

        match timed(
            self.options.extraction_timeout,
            self.extractor.extract(&documents, &urls),
        )
        .await
        {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(company = %company, error = %e, "Extraction failed, treating attempt as empty");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Primary attempt, conditional retry, merge
    // ------------------------------------------------------------------

    pub async fn resolve(&self, company: &CompanyQuery) -> (Option<CompanyProfile>, Resolution) {
        // Step 1: primary attempt
        let primary = self.attempt(company, &company.primary_search_query()).await;

        // Step 2: evaluate
        if !is_incomplete(primary.as_ref()) {
            info!(company = %company, "Primary attempt complete");
            return (primary, Resolution::Primary);
        }

        // Step 3: retry with the reformulated query
        let alternate = company.alternate_search_query();
        info!(
            company = %company,
            query = %alternate,
            had_primary = primary.is_some(),
            "Primary attempt incomplete, retrying"
        );
        let retry = self.attempt(company, &alternate).await;

        // Steps 4-6: replace, merge or keep
        let (profile, resolution) = resolve_attempts(primary, retry);
        info!(
            company = %company,
            resolution = ?resolution,
            complete = !is_incomplete(profile.as_ref()),
            "Attempts resolved"
        );
        (profile, resolution)
    }

    /// Resolves a profile and saves it when named. Only a failed save is an
    /// error.
    #[instrument(skip(self, company), fields(company = %company))]
    pub async fn run(&self, company: &CompanyQuery) -> Result<ExtractionOutcome> {
        let (profile, resolution) = self.resolve(company).await;

        let saved = match &profile {
            Some(profile) => self.store.save(profile).await?,
            None => false,
        };

        if !saved {
            warn!(company = %company, "No named profile produced");
        }

        Ok(ExtractionOutcome {
            query: company.clone(),
            profile,
            resolution,
            saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use akania_core::profile::KeyPerson;

    fn acme_primary() -> CompanyProfile {
        CompanyProfile {
            company_name: Some("Acme".into()),
            countries: vec![],
            sector: vec!["fintech".into()],
            business_description: Some("x".into()),
            key_people: vec![],
            transactions: Some("Seed round".into()),
            source_urls: vec!["https://acme.example".into()],
        }
    }

    fn acme_retry() -> CompanyProfile {
        CompanyProfile {
            company_name: Some(String::new()),
            countries: vec!["Kenya".into()],
            sector: vec![],
            business_description: Some(String::new()),
            key_people: vec![KeyPerson::new("Jo", "CEO")],
            transactions: Some("Series A".into()),
            source_urls: vec!["https://acme.example/about".into()],
        }
    }

    #[test]
    fn test_incomplete_retry_is_merged_into_primary() {
        let (profile, resolution) = resolve_attempts(Some(acme_primary()), Some(acme_retry()));
        let profile = profile.unwrap();

        assert_eq!(resolution, Resolution::Merged);
        assert_eq!(profile.company_name.as_deref(), Some("Acme"));
        assert_eq!(profile.countries, vec!["Kenya"]);
        assert_eq!(profile.sector, vec!["fintech"]);
        assert_eq!(profile.business_description.as_deref(), Some("x"));
        assert_eq!(profile.key_people, vec![KeyPerson::new("Jo", "CEO")]);
        assert_eq!(profile.transactions.as_deref(), Some("Seed round"));
        assert_eq!(profile.source_urls, vec!["https://acme.example"]);
    }

    #[test]
    fn test_complete_retry_replaces_primary() {
        let retry = CompanyProfile {
            company_name: Some("Acme Holdings".into()),
            countries: vec!["Ghana".into()],
            sector: vec!["logistics".into()],
            business_description: Some("y".into()),
            ..Default::default()
        };

        let (profile, resolution) = resolve_attempts(Some(acme_primary()), Some(retry.clone()));
        assert_eq!(resolution, Resolution::RetryReplaced);
        assert_eq!(profile, Some(retry));
    }

    #[test]
    fn test_missing_retry_keeps_primary() {
        let (profile, resolution) = resolve_attempts(Some(acme_primary()), None);
        assert_eq!(resolution, Resolution::PrimaryOnly);
        assert_eq!(profile, Some(acme_primary()));
    }

    #[test]
    fn test_retry_only() {
        let (profile, resolution) = resolve_attempts(None, Some(acme_retry()));
        assert_eq!(resolution, Resolution::RetryOnly);
        assert_eq!(profile, Some(acme_retry()));
    }

    #[test]
    fn test_nothing() {
        assert_eq!(resolve_attempts(None, None), (None, Resolution::Nothing));
    }
}
