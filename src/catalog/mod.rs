//! The movie catalog: records plus their positionally aligned embeddings.
//!
//! Both halves are loaded once at startup and never mutated afterwards, so a
//! `Catalog` can be shared behind an `Arc` without locking.

mod embeddings;
mod records;

pub use embeddings::{l2_norm, EmbeddingIndex};
pub use records::{Movie, RecordStore};

#[cfg(test)]
pub(crate) use embeddings::tests::npy_bytes;

use crate::error::{CineragError, Result};
use std::path::Path;
use tracing::{info, instrument};

/// Records and embeddings whose positions refer to the same movies.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: RecordStore,
    embeddings: EmbeddingIndex,
}

impl Catalog {
    /// Pair a record store with an embedding index.
    ///
    /// Fails with [`CineragError::Integrity`] when the lengths differ: row `i`
    /// of one must describe the same movie as row `i` of the other.
    pub fn from_parts(records: RecordStore, embeddings: EmbeddingIndex) -> Result<Self> {
        if records.len() != embeddings.len() {
            return Err(CineragError::Integrity(format!(
                "{} records but {} embeddings",
                records.len(),
                embeddings.len()
            )));
        }
        Ok(Self {
            records,
            embeddings,
        })
    }

    /// Load both sources from disk and check their alignment.
    #[instrument(skip_all)]
    pub fn load(records_path: &Path, embeddings_path: &Path) -> Result<Self> {
        let embeddings = EmbeddingIndex::load(embeddings_path)
            .map_err(|e| integrity("embeddings", embeddings_path, e))?;
        let records =
            RecordStore::load(records_path).map_err(|e| integrity("records", records_path, e))?;

        let catalog = Self::from_parts(records, embeddings)?;
        info!(
            "Catalog ready: {} movies, {} dimensions",
            catalog.len(),
            catalog.dimensions()
        );
        Ok(catalog)
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn embeddings(&self) -> &EmbeddingIndex {
        &self.embeddings
    }

    /// Number of movies (equal to the number of embeddings).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimensionality expected from the query embedder.
    pub fn dimensions(&self) -> usize {
        self.embeddings.dimensions()
    }
}

/// Any failure while loading a catalog source is fatal for startup.
fn integrity(what: &str, path: &Path, err: CineragError) -> CineragError {
    match err {
        CineragError::Integrity(msg) => {
            CineragError::Integrity(format!("{} ({}): {}", what, path.display(), msg))
        }
        other => CineragError::Integrity(format!(
            "failed to load {} from {}: {}",
            what,
            path.display(),
            other
        )),
    }
}
