pub mod config;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod profile;
pub mod query;
pub mod search;
pub mod store;

pub use config::{AppConfig, SearchBackendConfig, SetupReport};
pub use error::{AkaniaError, Result};
pub use extraction::ExtractionEngine;
pub use fetch::{FetchedDocument, Fetcher};
pub use profile::{is_incomplete, sanitize_name, CompanyProfile, KeyPerson};
pub use query::CompanyQuery;
pub use search::{is_valid_url, SearchBackend, SearchRequest, SearchResult};
pub use store::ProfileStore;
