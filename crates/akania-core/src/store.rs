use async_trait::async_trait;

use crate::error::Result;
use crate::profile::CompanyProfile;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Persists `profile` under its storage key, replacing any previous
    /// record with that key. Returns `false` without writing when the
    /// profile has no name.
    async fn save(&self, profile: &CompanyProfile) -> Result<bool>;

    /// Every readable stored record, as raw JSON. Unreadable records are
    /// skipped.
    async fn load_all(&self) -> Result<Vec<serde_json::Value>>;
}
