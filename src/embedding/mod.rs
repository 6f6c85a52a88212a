//! Query embedding for semantic retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::config::{ProviderKind, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Maps question text to a vector in the same space as the catalog embeddings.
///
/// Implementations report failures as [`crate::CineragError::Retrieval`] and
/// never substitute a placeholder vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, for logs and diagnostics.
    fn model(&self) -> &str;
}

/// Build the configured embedder.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let model = &settings.embedding.model;
    let dimensions = settings.embedding.dimensions;

    let embedder: Arc<dyn Embedder> = match settings.provider.kind {
        ProviderKind::OpenAI => Arc::new(OpenAIEmbedder::new(
            crate::openai::create_client_with_timeout(std::time::Duration::from_secs(
                settings.provider.timeout_secs,
            ))?,
            model,
            dimensions,
        )),
        ProviderKind::Azure => Arc::new(OpenAIEmbedder::new(
            crate::openai::create_azure_client(settings, model)?,
            model,
            dimensions,
        )),
    };
    Ok(embedder)
}
