use thiserror::Error;

#[derive(Error, Debug)]
pub enum AkaniaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search backend error ({backend}): {message}")]
    Search { backend: String, message: String },

    #[error("Fetch error ({url}): {message}")]
    Fetch { url: String, message: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Profile store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, AkaniaError>;
