//! Similarity ranking over the embedding index.
//!
//! A full linear scan: every stored vector is scored against the query with
//! cosine similarity, then the scores are sorted and cut to `k`.

use crate::catalog::{l2_norm, EmbeddingIndex};
use crate::error::{CineragError, Result};
use std::num::NonZeroUsize;
use tracing::{debug, instrument};

/// A record position paired with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub index: usize,
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// A zero-norm or non-finite input has no defined similarity and is reported
/// as [`CineragError::Similarity`] rather than scored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(CineragError::Similarity(format!(
            "length mismatch ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    let norm_a = checked_norm(a)?;
    let norm_b = checked_norm(b)?;
    Ok(score(dot(a, b), norm_a, norm_b))
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn score(dot: f32, norm_a: f32, norm_b: f32) -> f32 {
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn checked_norm(vector: &[f32]) -> Result<f32> {
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(CineragError::Similarity(
            "vector contains non-finite values".to_string(),
        ));
    }
    let norm = l2_norm(vector);
    if norm == 0.0 || !norm.is_finite() {
        return Err(CineragError::Similarity("vector has zero norm".to_string()));
    }
    Ok(norm)
}

/// Ranks stored embeddings by similarity to a query vector.
pub struct SimilarityRanker<'a> {
    embeddings: &'a EmbeddingIndex,
}

impl<'a> SimilarityRanker<'a> {
    pub fn new(embeddings: &'a EmbeddingIndex) -> Self {
        Self { embeddings }
    }

    /// Return at most `k` candidates, best first.
    ///
    /// Equal scores keep storage order. An empty index yields an empty result.
    /// A query whose dimensionality differs from the index is a retrieval fault.
    #[instrument(skip_all, fields(k = k.get(), size = self.embeddings.len()))]
    pub fn rank(&self, query: &[f32], k: NonZeroUsize) -> Result<Vec<RankedCandidate>> {
        if self.embeddings.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.embeddings.dimensions() {
            return Err(CineragError::Retrieval(format!(
                "query has {} dimensions but the index has {}",
                query.len(),
                self.embeddings.dimensions()
            )));
        }
        let query_norm = checked_norm(query)?;

        let mut scored: Vec<RankedCandidate> = self
            .embeddings
            .rows()
            .enumerate()
            .map(|(index, (vector, norm))| RankedCandidate {
                index,
                score: score(dot(query, vector), query_norm, norm),
            })
            .collect();

        // `sort_by` is stable, which is what keeps ties in storage order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k.get());

        debug!(
            "Top score {:?} over {} candidates",
            scored.first().map(|c| c.score),
            self.embeddings.len()
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn five() -> EmbeddingIndex {
        EmbeddingIndex::from_vectors(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.7, 0.7, 0.0],
            vec![0.2, 0.3, 0.9],
            vec![-1.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]).unwrap() - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).unwrap().abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]).unwrap() + 1.0).abs() < 0.001);
        // Magnitude does not matter.
        assert!((cosine_similarity(&a, &[42.0, 0.0, 0.0]).unwrap() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_zero_norm_is_fault() {
        let err = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, CineragError::Similarity(_)));
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_identical_vector_ranks_first() {
        let index = five();
        let query = index.vector(3).unwrap().to_vec();

        let ranked = SimilarityRanker::new(&index).rank(&query, k(3)).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].index, 3);
        assert!((ranked[0].score - 1.0).abs() < 1e-5);
        assert!(ranked[0].score >= ranked[1].score);
        assert!(ranked[1].score >= ranked[2].score);
    }

    #[test]
    fn test_top_k_bound_and_order() {
        let index = five();
        let ranker = SimilarityRanker::new(&index);
        let query = [0.3, 0.5, 0.1];

        for n in 1..=8 {
            let ranked = ranker.rank(&query, k(n)).unwrap();
            assert_eq!(ranked.len(), n.min(index.len()));
            assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_ties_keep_storage_order() {
        let index = EmbeddingIndex::from_vectors(vec![
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.5, -1.0, 0.3],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        let ranker = SimilarityRanker::new(&index);

        for _ in 0..10 {
            let ranked = ranker.rank(&[2.0, 2.0, 0.0], k(2)).unwrap();
            let order: Vec<usize> = ranked.iter().map(|c| c.index).collect();
            assert_eq!(order, vec![1, 4]);
        }
    }

    #[test]
    fn test_scaled_duplicates_tie() {
        // Same direction, different magnitude: identical cosine score.
        let index = EmbeddingIndex::from_vectors(vec![
            vec![0.0, 1.0],
            vec![3.0, 4.0],
            vec![6.0, 8.0],
        ])
        .unwrap();
        let ranked = SimilarityRanker::new(&index).rank(&[3.0, 4.0], k(3)).unwrap();
        let order: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_index() {
        let index = EmbeddingIndex::default();
        let ranked = SimilarityRanker::new(&index)
            .rank(&[1.0, 2.0, 3.0], k(5))
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_query_faults() {
        let index = five();
        let ranker = SimilarityRanker::new(&index);

        assert!(matches!(
            ranker.rank(&[1.0, 0.0], k(2)),
            Err(CineragError::Retrieval(_))
        ));
        assert!(matches!(
            ranker.rank(&[0.0, 0.0, 0.0], k(2)),
            Err(CineragError::Similarity(_))
        ));
        assert!(matches!(
            ranker.rank(&[f32::NAN, 0.0, 1.0], k(2)),
            Err(CineragError::Similarity(_))
        ));
    }
}
