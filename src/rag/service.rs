//! The question answering pipeline.

use super::{AnswerGenerator, ContextAssembler, RankedCandidate, SimilarityRanker};
use crate::catalog::Catalog;
use crate::config::{Prompts, Settings};
use crate::embedding::Embedder;
use crate::error::{CineragError, Result};
use crate::llm::LanguageModel;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A retrieved movie.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Position in the catalog.
    pub index: usize,
    pub title: String,
    pub year: Option<String>,
    /// Cosine similarity to the question.
    pub score: f32,
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The language model answered from retrieved records.
    Grounded,
    /// Nothing was retrieved; the fixed fallback text was returned.
    NoMatches,
}

/// Result of asking a question.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub outcome: AnswerOutcome,
    /// Records the answer was grounded on, most similar first.
    pub sources: Vec<Source>,
}

/// Long-lived service answering questions about the catalog.
///
/// Built once at startup and shared by reference; nothing in it is mutated
/// after construction, so concurrent requests need no locking.
pub struct RagService {
    catalog: Arc<Catalog>,
    embedder: Arc<dyn Embedder>,
    generator: AnswerGenerator,
    top_k: NonZeroUsize,
}

impl RagService {
    /// Create a service with the default `top_k` of 5.
    pub fn new(
        catalog: Arc<Catalog>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        prompts: Prompts,
    ) -> Self {
        Self {
            catalog,
            embedder,
            generator: AnswerGenerator::new(llm, prompts),
            top_k: NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Build the service from configuration: load and check the catalog, then
    /// connect the configured embedder and chat model. `model` overrides
    /// `rag.model`.
    pub async fn from_settings(settings: &Settings, model: Option<&str>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let records_path = settings.records_path();
        let embeddings_path = settings.embeddings_path();
        let catalog = tokio::task::spawn_blocking(move || {
            Catalog::load(&records_path, &embeddings_path)
        })
        .await
        .map_err(|e| CineragError::Integrity(format!("catalog loading task failed: {}", e)))??;

        let embedder = crate::embedding::from_settings(settings)?;
        let llm = crate::llm::from_settings(settings, model)?;
        info!(
            embedding_model = embedder.model(),
            chat_model = llm.model(),
            "Service ready"
        );

        Ok(Self::new(Arc::new(catalog), embedder, llm, prompts).with_top_k(settings.rag.top_k))
    }

    /// Set how many records are placed in the context.
    pub fn with_top_k(mut self, top_k: NonZeroUsize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn top_k(&self) -> NonZeroUsize {
        self.top_k
    }

    /// Embed the question and rank the catalog against it.
    #[instrument(skip(self, k), fields(k = k.get()))]
    pub async fn search(&self, question: &str, k: NonZeroUsize) -> Result<Vec<Source>> {
        if question.trim().is_empty() {
            return Err(CineragError::InvalidInput("question is empty".to_string()));
        }

        let query = self.embedder.embed(question).await?;

        // The scan is CPU bound; keep it off the async workers.
        let catalog = Arc::clone(&self.catalog);
        let ranked = tokio::task::spawn_blocking(move || {
            SimilarityRanker::new(catalog.embeddings()).rank(&query, k)
        })
        .await
        .map_err(|e| CineragError::Similarity(format!("ranking task failed: {}", e)))??;

        debug!("Retrieved {} candidates", ranked.len());
        Ok(self.sources(&ranked))
    }

    /// Answer a question from the top `top_k` records.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        info!("Processing question");
        let sources = self.search(question, self.top_k).await?;

        let indices: Vec<usize> = sources.iter().map(|s| s.index).collect();
        let context = ContextAssembler::new(self.catalog.records()).assemble(&indices)?;

        if context.is_empty() {
            info!("No candidates retrieved");
            return Ok(Answer {
                text: self.generator.no_context_answer().to_string(),
                outcome: AnswerOutcome::NoMatches,
                sources,
            });
        }

        let text = self.generator.answer(question, &context).await?;
        Ok(Answer {
            text,
            outcome: AnswerOutcome::Grounded,
            sources,
        })
    }

    fn sources(&self, ranked: &[RankedCandidate]) -> Vec<Source> {
        let records = self.catalog.records();
        ranked
            .iter()
            .filter_map(|c| {
                records.get(c.index).map(|movie| Source {
                    index: c.index,
                    title: movie.display_title().to_string(),
                    year: movie.year.clone(),
                    score: c.score,
                })
            })
            .collect()
    }
}
