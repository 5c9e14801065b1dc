use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPerson {
    pub name: String,
    pub title: String,
}

impl KeyPerson {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }
}

/// Structured profile of one company. Serialized flat, with field names as
/// they appear here, both for the completion schema and for persisted files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyProfile {
    pub company_name: Option<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub sector: Vec<String>,
    #[serde(default)]
    pub business_description: Option<String>,
    #[serde(default)]
    pub key_people: Vec<KeyPerson>,
    #[serde(default)]
    pub transactions: Option<String>,
    #[serde(default)]
    pub source_urls: Vec<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl CompanyProfile {
    /// The company name if present and not blank.
    pub fn name(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Required facts: name, countries, sector and description. People,
    /// transactions and sources are enrichments and never make a profile
    /// incomplete.
    pub fn is_complete(&self) -> bool {
        !is_blank(&self.company_name)
            && !self.countries.is_empty()
            && !self.sector.is_empty()
            && !is_blank(&self.business_description)
    }

    /// Fills each empty required field and `key_people` from `other`. A
    /// populated field is never overwritten. `transactions` and
    /// `source_urls` are left untouched.
    pub fn fill_missing_from(&mut self, other: &CompanyProfile) {
        if is_blank(&self.company_name) {
            self.company_name = other.company_name.clone();
        }
        if self.countries.is_empty() {
            self.countries = other.countries.clone();
        }
        if self.sector.is_empty() {
            self.sector = other.sector.clone();
        }
        if is_blank(&self.business_description) {
            self.business_description = other.business_description.clone();
        }
        if self.key_people.is_empty() {
            self.key_people = other.key_people.clone();
        }
    }

    /// Filesystem-safe persistence key, see [`sanitize_name`]. Distinct
    /// names may map to the same key.
    pub fn storage_key(&self) -> Option<String> {
        self.name().map(sanitize_name)
    }
}

/// Spaces and path separators become underscores, parentheses are dropped,
/// and a leading dot becomes an underscore so the key is never hidden or a
/// path.
pub fn sanitize_name(name: &str) -> String {
    let key = name.replace([' ', '/', '\\'], "_").replace(['(', ')'], "");
    match key.strip_prefix('.') {
        Some(rest) => format!("_{rest}"),
        None => key,
    }
}

/// Absent profiles are incomplete.
pub fn is_incomplete(profile: Option<&CompanyProfile>) -> bool {
    profile.map_or(true, |p| !p.is_complete())
}
