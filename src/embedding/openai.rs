//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{CineragError, Result};
use async_openai::config::{Config, OpenAIConfig};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Embedder backed by the OpenAI (or Azure OpenAI) embeddings endpoint.
pub struct OpenAIEmbedder<C: Config = OpenAIConfig> {
    client: Client<C>,
    model: String,
    dimensions: Option<u32>,
}

impl<C: Config> OpenAIEmbedder<C> {
    /// Create an embedder. `dimensions` is only sent when set, since older
    /// models reject the parameter.
    pub fn new(client: Client<C>, model: &str, dimensions: Option<u32>) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }

    /// Requested output dimensionality, if any.
    pub fn dimensions(&self) -> Option<u32> {
        self.dimensions
    }
}

#[async_trait]
impl<C> Embedder for OpenAIEmbedder<C>
where
    C: Config + Send + Sync + 'static,
{
    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model)
            .input(EmbeddingInput::String(text.to_string()));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args
            .build()
            .map_err(|e| CineragError::Retrieval(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| CineragError::Retrieval(format!("Embedding API error: {}", e)))?;

        let embedding = response
            .data
            .into_iter()
            .min_by_key(|e| e.index)
            .map(|e| e.embedding)
            .ok_or_else(|| CineragError::Retrieval("Empty embedding response".to_string()))?;

        debug!("Embedded query into {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let client = crate::openai::create_client().unwrap();
        let embedder = OpenAIEmbedder::new(client, "text-embedding-ada-002", None);
        assert_eq!(embedder.model(), "text-embedding-ada-002");
        assert_eq!(embedder.dimensions(), None);

        let client = crate::openai::create_client().unwrap();
        let embedder = OpenAIEmbedder::new(client, "text-embedding-3-large", Some(1024));
        assert_eq!(embedder.dimensions(), Some(1024));
    }
}
