use serde::{Deserialize, Serialize};

const PRIMARY_QUERY_PREFIX: &str = "I need only website urls for";
const PROFILE_QUERY_SUFFIX: &str = "company about business information profile";

/// Free-text company identifier as given by the user, e.g. `"Jumia (Kenya)"`
/// or `"Flutterwave Nigeria"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyQuery(String);

impl CompanyQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier up to the first `(`, trimmed. The whole identifier when
    /// there is no region suffix.
    pub fn company_name(&self) -> &str {
        match self.0.find('(') {
            Some(idx) => self.0[..idx].trim(),
            None => self.0.trim(),
        }
    }

    /// Query biased toward official websites.
    pub fn primary_search_query(&self) -> String {
        format!("{PRIMARY_QUERY_PREFIX} {}", self.0)
    }

    /// Reformulated query used when the first attempt came back incomplete.
    pub fn alternate_search_query(&self) -> String {
        format!("{} {PROFILE_QUERY_SUFFIX}", self.company_name())
    }

    /// Lowercased words of the company name, used for URL relevance ranking.
    pub fn name_tokens(&self) -> Vec<String> {
        self.company_name()
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect()
    }
}

impl std::fmt::Display for CompanyQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompanyQuery {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_name_strips_region() {
        let q = CompanyQuery::new("Jumia (Kenya)");
        assert_eq!(q.company_name(), "Jumia");
    }

    #[test]
    fn test_company_name_without_region() {
        let q = CompanyQuery::new("  Flutterwave Nigeria ");
        assert_eq!(q.company_name(), "Flutterwave Nigeria");
    }

    #[test]
    fn test_search_queries() {
        let q = CompanyQuery::new("Kuda Bank (Nigeria)");
        assert_eq!(
            q.primary_search_query(),
            "I need only website urls for Kuda Bank (Nigeria)"
        );
        assert_eq!(
            q.alternate_search_query(),
            "Kuda Bank company about business information profile"
        );
    }

    #[test]
    fn test_name_tokens() {
        let q = CompanyQuery::new("Kuda Bank (Nigeria)");
        assert_eq!(q.name_tokens(), vec!["kuda", "bank"]);
    }
}
