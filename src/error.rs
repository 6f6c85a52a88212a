//! Error types for Cinerag.

use thiserror::Error;

/// Library-level error type for Cinerag operations.
#[derive(Error, Debug)]
pub enum CineragError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The record table and the embedding index cannot be trusted together.
    #[error("Catalog integrity violation: {0}")]
    Integrity(String),

    /// The question could not be embedded.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The language model could not produce an answer.
    #[error("Answer generation failed: {0}")]
    Generation(String),

    /// Cosine similarity is undefined for the given vectors.
    #[error("Similarity computation failed: {0}")]
    Similarity(String),

    #[error("Dataset download failed: {0}")]
    Download(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CineragError {
    /// Whether this error means a request could not be attempted because a
    /// collaborator (embedder or language model) failed.
    pub fn is_request_fault(&self) -> bool {
        matches!(self, Self::Retrieval(_) | Self::Generation(_))
    }
}

/// Result type alias for Cinerag operations.
pub type Result<T> = std::result::Result<T, CineragError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_faults() {
        assert!(CineragError::Retrieval("quota".into()).is_request_fault());
        assert!(CineragError::Generation("timeout".into()).is_request_fault());
        assert!(!CineragError::Integrity("len".into()).is_request_fault());
        assert!(!CineragError::InvalidInput("blank".into()).is_request_fault());
    }
}
