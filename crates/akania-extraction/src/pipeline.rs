use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use akania_core::config::AppConfig;
use akania_core::error::{AkaniaError, Result};
use akania_core::extraction::ExtractionEngine;
use akania_core::fetch::FetchedDocument;
use akania_core::profile::{CompanyProfile, KeyPerson};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const MAX_TOKENS: u32 = 4096;
/// Per-document cap on text sent to the model.
const MAX_DOCUMENT_CHARS: usize = 12_000;

/// Values models emit when they have nothing to say; treated as absent.
const PLACEHOLDER_VALUES: &[&str] = &["n/a", "na", "none", "null", "unknown", "not available", "not specified", "-"];

/// The completion service: system instructions plus user content in, raw
/// model text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Messages API client. One user turn per call, deterministic sampling.
pub struct AnthropicCompletion {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Error bodies are truncated to this many characters in error messages.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserTurn<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// All text blocks joined; `None` when the reply carries no text.
    fn into_text(self) -> Option<String> {
        let text: String = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl AnthropicCompletion {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if !config.has_completion_credentials() {
            return Err(AkaniaError::Config("ANTHROPIC_API_KEY is not set".into()));
        }

        let client = reqwest::Client::builder()
            .user_agent("akania-profiler/0.1")
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: config.anthropic_api_key.clone(),
            api_url: config
                .anthropic_api_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
            model: config.model.clone(),
        })
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system,
            messages: [UserTurn {
                role: "user",
                content: user,
            }],
        }
    }
}

#[async_trait]
impl CompletionService for AnthropicCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            endpoint = %self.api_url,
            prompt_chars = user.len(),
            "Requesting profile completion"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request(system, user))
            .send()
            .await
            .map_err(|e| AkaniaError::Extraction(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AkaniaError::Extraction(format!(
                "completion service returned {status}: {}",
                body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>()
            )));
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AkaniaError::Extraction(format!("unreadable completion reply: {e}")))?;

        let stop_reason = reply.stop_reason.clone();
        let usage = reply.usage.as_ref().map(|u| (u.input_tokens, u.output_tokens));
        let text = reply.into_text().ok_or_else(|| {
            AkaniaError::Extraction("completion reply has no text".to_string())
        })?;

        tracing::debug!(
            stop_reason = ?stop_reason,
            usage = ?usage,
            reply_chars = text.len(),
            "Completion received"
        );

        Ok(text)
    }
}

// ── Intermediate JSON schema for LLM output parsing ────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmProfile {
    company_name: Option<String>,
    countries: Option<StringOrList>,
    sector: Option<StringOrList>,
    business_description: Option<String>,
    key_people: Option<Vec<LlmPerson>>,
    transactions: Option<StringOrList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LlmPerson {
    name: Option<String>,
    title: Option<String>,
}

/// Models occasionally answer a list field with a bare string or the other
/// way round.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(s) => vec![s],
            StringOrList::Many(v) => v,
        }
    }
}

/// Profile extraction over a single completion call per attempt.
pub struct LlmExtractionEngine {
    completion: Arc<dyn CompletionService>,
}

impl LlmExtractionEngine {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_completion(Arc::new(AnthropicCompletion::new(
            config,
        )?)))
    }

    pub fn with_completion(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub fn build_system_prompt() -> String {
        r#"You extract structured company profiles from web pages, with a focus on African markets.

Return ONLY valid JSON (no markdown fences, no commentary) matching this exact schema:

{
  "company_name": "Official company name, or null",
  "countries": ["Countries where the company operates, African countries where stated"],
  "sector": ["Industry sectors the company belongs to"],
  "business_description": "Description of the company's business in about 100 words, or null",
  "key_people": [{"name": "Full name", "title": "Role or job title"}],
  "transactions": "Funding rounds, acquisitions, partnerships or other transactions, or null"
}

Rules:
- Use ONLY facts explicitly stated in the provided content. Do not infer, guess or use outside knowledge.
- If a fact is not stated, use null for text fields and [] for list fields.
- Include a key person only when both the name and the title are stated.
- Do not repeat the same country, sector or person twice.
- Output ONLY the JSON object. No additional text."#
            .to_string()
    }

    pub fn build_user_prompt(documents: &[FetchedDocument], urls: &[String]) -> String {
        let mut prompt = String::from("Source URLs:\n");
        for url in urls {
            prompt.push_str(&format!("- {url}\n"));
        }

        for (i, document) in documents.iter().enumerate() {
            prompt.push_str(&format!("\n=== Document {} ===\n", i + 1));
            prompt.push_str(&format!("URL: {}\n", document.url));
            if let Some(title) = &document.title {
                prompt.push_str(&format!("Title: {title}\n"));
            }
            let text: String = document.text.chars().take(MAX_DOCUMENT_CHARS).collect();
            prompt.push_str(&format!("\n{text}\n"));
        }

        prompt
    }

    fn clean_text(value: Option<String>) -> Option<String> {
        let value = value?;
        let trimmed = value.trim();
        if trimmed.is_empty() || PLACEHOLDER_VALUES.contains(&trimmed.to_lowercase().as_str()) {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Trims, drops placeholders and removes duplicates, keeping first-seen
    /// order.
    fn clean_list(values: Vec<String>) -> Vec<String> {
        let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            if let Some(value) = Self::clean_text(Some(value)) {
                if !cleaned.iter().any(|c| c.eq_ignore_ascii_case(&value)) {
                    cleaned.push(value);
                }
            }
        }
        cleaned
    }

    pub(crate) fn parse_llm_response(raw_json: &str, urls: &[String]) -> Result<CompanyProfile> {
        // Strip potential markdown code fences the LLM might include despite instructions
        let cleaned = raw_json.trim();
        let cleaned = if cleaned.starts_with("```") {
            match (cleaned.find('{'), cleaned.rfind('}')) {
                (Some(start), Some(end)) if start < end => &cleaned[start..=end],
                _ => cleaned,
            }
        } else {
            cleaned
        };

        let output: LlmProfile = serde_json::from_str(cleaned).map_err(|e| {
            tracing::error!(raw = %cleaned, error = %e, "Failed to parse LLM extraction JSON");
            AkaniaError::Extraction(format!("Failed to parse LLM JSON output: {e}"))
        })?;

        let key_people = output
            .key_people
            .unwrap_or_default()
            .into_iter()
            .filter_map(|person| {
                let name = Self::clean_text(person.name)?;
                let title = Self::clean_text(person.title)?;
                Some(KeyPerson { name, title })
            })
            .fold(Vec::<KeyPerson>::new(), |mut people, person| {
                if !people.contains(&person) {
                    people.push(person);
                }
                people
            });

        let transactions = output
            .transactions
            .map(|t| t.into_vec().join("; "))
            .and_then(|t| Self::clean_text(Some(t)));

        let profile = CompanyProfile {
            company_name: Self::clean_text(output.company_name),
            countries: Self::clean_list(
                output.countries.map(StringOrList::into_vec).unwrap_or_default(),
            ),
            sector: Self::clean_list(output.sector.map(StringOrList::into_vec).unwrap_or_default()),
            business_description: Self::clean_text(output.business_description),
            key_people,
            transactions,
            source_urls: urls.to_vec(),
        };

        tracing::info!(
            company = ?profile.company_name,
            countries = profile.countries.len(),
            sectors = profile.sector.len(),
            key_people = profile.key_people.len(),
            "Parsed extraction results"
        );

        Ok(profile)
    }
}

#[async_trait]
impl ExtractionEngine for LlmExtractionEngine {
    async fn extract(
        &self,
        documents: &[FetchedDocument],
        urls: &[String],
    ) -> Result<CompanyProfile> {
        tracing::info!(
            documents = documents.len(),
            urls = urls.len(),
            "Starting profile extraction"
        );

        let raw_json = self
            .completion
            .complete(&Self::build_system_prompt(), &Self::build_user_prompt(documents, urls))
            .await?;

        Self::parse_llm_response(&raw_json, urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedCompletion {
        reply: Result<String>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl CannedCompletion {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(AkaniaError::Extraction("service unavailable".into())),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionService for CannedCompletion {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AkaniaError::Extraction(e.to_string())),
            }
        }
    }

    fn urls() -> Vec<String> {
        vec![
            "https://flutterwave.com".to_string(),
            "https://flutterwave.com/about".to_string(),
        ]
    }

    #[test]
    fn test_parse_llm_response_valid() {
        let json = r#"{
            "company_name": "Flutterwave",
            "countries": ["Nigeria", "Kenya", "Nigeria"],
            "sector": ["Fintech", "Payments"],
            "business_description": "Flutterwave builds payment infrastructure.",
            "key_people": [
                {"name": "Olugbenga Agboola", "title": "CEO"},
                {"name": "Someone", "title": ""}
            ],
            "transactions": "Raised $250M Series D in 2022"
        }"#;

        let profile = LlmExtractionEngine::parse_llm_response(json, &urls()).unwrap();

        assert_eq!(profile.company_name.as_deref(), Some("Flutterwave"));
        assert_eq!(profile.countries, vec!["Nigeria", "Kenya"]);
        assert_eq!(profile.sector, vec!["Fintech", "Payments"]);
        assert_eq!(
            profile.key_people,
            vec![KeyPerson::new("Olugbenga Agboola", "CEO")]
        );
        assert_eq!(
            profile.transactions.as_deref(),
            Some("Raised $250M Series D in 2022")
        );
        assert_eq!(profile.source_urls, urls());
    }

    #[test]
    fn test_parse_llm_response_with_code_fences() {
        let json = "```json\n{\"company_name\": \"Sendy\", \"countries\": [\"Kenya\"]}\n```";
        let profile = LlmExtractionEngine::parse_llm_response(json, &[]).unwrap();
        assert_eq!(profile.company_name.as_deref(), Some("Sendy"));
        assert_eq!(profile.countries, vec!["Kenya"]);
        assert!(profile.sector.is_empty());
    }

    #[test]
    fn test_parse_llm_response_placeholders_become_empty() {
        let json = r#"{
            "company_name": "Kobo360",
            "countries": ["N/A"],
            "sector": "Unknown",
            "business_description": "  ",
            "key_people": null,
            "transactions": null
        }"#;

        let profile = LlmExtractionEngine::parse_llm_response(json, &[]).unwrap();
        assert!(profile.countries.is_empty());
        assert!(profile.sector.is_empty());
        assert!(profile.business_description.is_none());
        assert!(profile.key_people.is_empty());
        assert!(profile.transactions.is_none());
    }

    #[test]
    fn test_parse_llm_response_invalid_json() {
        let result = LlmExtractionEngine::parse_llm_response("not json at all", &[]);
        assert!(matches!(result, Err(AkaniaError::Extraction(_))));
    }

    #[test]
    fn test_parse_llm_response_fence_with_reversed_braces() {
        for raw in ["```json\n} sorry, no data {", "```\n}{", "```json\n}"] {
            let result = LlmExtractionEngine::parse_llm_response(raw, &[]);
            assert!(matches!(result, Err(AkaniaError::Extraction(_))), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_llm_response_single_country_string() {
        let json = r#"{"company_name": "Sendy", "countries": "Kenya", "sector": ["Logistics"]}"#;
        let profile = LlmExtractionEngine::parse_llm_response(json, &[]).unwrap();
        assert_eq!(profile.company_name.as_deref(), Some("Sendy"));
        assert_eq!(profile.countries, vec!["Kenya"]);
        assert_eq!(profile.sector, vec!["Logistics"]);
    }

    #[test]
    fn test_messages_request_shape() {
        let config = AppConfig {
            anthropic_api_key: "sk-test".into(),
            anthropic_api_url: Some("http://127.0.0.1:9/v1/messages".into()),
            model: "test-model".into(),
            tavily_api_key: None,
            serpapi_api_key: None,
            data_dir: "data".into(),
            max_urls: 3,
            http_timeout_secs: 2,
            batch_concurrency: 1,
        };
        let client = AnthropicCompletion::new(&config).unwrap();
        assert_eq!(client.api_url, "http://127.0.0.1:9/v1/messages");

        let body = serde_json::to_value(client.request("sys", "pages")).unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "pages");
    }

    #[test]
    fn test_messages_response_text_blocks() {
        let reply: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking", "thinking": "..."}, {"type": "text", "text": "{}"}],
                "stop_reason": "end_turn", "usage": {"input_tokens": 10, "output_tokens": 2}}"#,
        )
        .unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("{}"));

        let empty: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[test]
    fn test_system_prompt_forbids_inference() {
        let prompt = LlmExtractionEngine::build_system_prompt();
        assert!(prompt.contains("explicitly stated"));
        assert!(prompt.contains("Do not infer"));
        for field in [
            "company_name",
            "countries",
            "sector",
            "business_description",
            "key_people",
            "transactions",
        ] {
            assert!(prompt.contains(field), "schema missing {field}");
        }
    }

    #[tokio::test]
    async fn test_extract_combines_all_documents_in_one_call() {
        let completion = CannedCompletion::ok(r#"{"company_name": "Flutterwave"}"#);
        let engine = LlmExtractionEngine::with_completion(completion.clone());

        let documents = vec![
            FetchedDocument::new("https://flutterwave.com", "Payments for Africa"),
            FetchedDocument::new("https://flutterwave.com/about", "Founded in Lagos"),
        ];
        engine.extract(&documents, &urls()).await.unwrap();

        let seen = completion.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let user = &seen[0].1;
        assert!(user.contains("Payments for Africa"));
        assert!(user.contains("Founded in Lagos"));
        assert!(user.contains("https://flutterwave.com/about"));
    }

    #[tokio::test]
    async fn test_sector_absent_from_documents_stays_empty() {
        let completion = CannedCompletion::ok(
            r#"{"company_name": "Cellulant", "countries": ["Kenya"], "sector": [], "business_description": "Cellulant runs a payments platform."}"#,
        );
        let engine = LlmExtractionEngine::with_completion(completion);
        let documents = vec![FetchedDocument::new(
            "https://cellulant.io",
            "Cellulant runs a payments platform in Kenya.",
        )];

        let profile = engine
            .extract(&documents, &["https://cellulant.io".to_string()])
            .await
            .unwrap();

        assert!(profile.sector.is_empty());
        assert!(!profile.is_complete());
        assert_eq!(profile.source_urls, vec!["https://cellulant.io"]);
    }

    #[tokio::test]
    async fn test_completion_failure_is_typed_error() {
        let engine = LlmExtractionEngine::with_completion(CannedCompletion::failing());
        let result = engine.extract(&[], &[]).await;
        assert!(matches!(result, Err(AkaniaError::Extraction(_))));
    }

    #[test]
    fn test_document_text_is_capped() {
        let long = "a".repeat(MAX_DOCUMENT_CHARS + 500);
        let prompt = LlmExtractionEngine::build_user_prompt(
            &[FetchedDocument::new("https://example.com", long)],
            &[],
        );
        assert!(prompt.len() < MAX_DOCUMENT_CHARS + 200);
    }
}
