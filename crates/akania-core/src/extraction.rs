use async_trait::async_trait;

use crate::error::Result;
use crate::fetch::FetchedDocument;
use crate::profile::CompanyProfile;

#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Derives one profile from all `documents` in a single completion call.
    /// The returned `source_urls` are exactly `urls`.
    async fn extract(&self, documents: &[FetchedDocument], urls: &[String])
        -> Result<CompanyProfile>;
}
