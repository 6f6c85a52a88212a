//! RAG (Retrieval-Augmented Generation) over the movie catalog.
//!
//! question → [`Embedder`](crate::embedding::Embedder) → [`SimilarityRanker`]
//! → [`ContextAssembler`] → [`AnswerGenerator`] → answer. [`RagService`] wires
//! the stages together.

pub mod context;
mod generator;
mod ranker;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{Context, ContextAssembler};
pub use generator::AnswerGenerator;
pub use ranker::{cosine_similarity, RankedCandidate, SimilarityRanker};
pub use service::{Answer, AnswerOutcome, RagService, Source};
