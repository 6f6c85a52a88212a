//! Context building for RAG responses.
//!
//! Each retrieved movie becomes one paragraph with a fixed field order. Missing
//! values are rendered as a placeholder instead of being dropped, so every
//! paragraph has the same shape.

use crate::catalog::{Movie, RecordStore};
use crate::error::{CineragError, Result};

/// Placeholder for missing fields.
pub const UNKNOWN: &str = "Desconocido";

/// Placeholder for a missing description.
pub const NO_DESCRIPTION: &str = "Ninguna";

/// Text handed to the answer generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Retrieval produced no candidates.
    Empty,
    /// Rendered movie paragraphs, most similar first.
    Records(String),
}

impl Context {
    pub fn is_empty(&self) -> bool {
        matches!(self, Context::Empty)
    }

    /// The rendered text; empty for [`Context::Empty`].
    pub fn as_str(&self) -> &str {
        match self {
            Context::Empty => "",
            Context::Records(text) => text,
        }
    }
}

/// Renders ranked records into a context block.
pub struct ContextAssembler<'a> {
    records: &'a RecordStore,
    unknown: String,
    no_description: String,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(records: &'a RecordStore) -> Self {
        Self {
            records,
            unknown: UNKNOWN.to_string(),
            no_description: NO_DESCRIPTION.to_string(),
        }
    }

    /// Override the placeholders used for missing values.
    pub fn with_placeholders(mut self, unknown: &str, no_description: &str) -> Self {
        self.unknown = unknown.to_string();
        self.no_description = no_description.to_string();
        self
    }

    /// Render the records at `indices`, in the given order, separated by a
    /// blank line.
    pub fn assemble(&self, indices: &[usize]) -> Result<Context> {
        if indices.is_empty() {
            return Ok(Context::Empty);
        }

        let blocks = indices
            .iter()
            .map(|&i| {
                self.records
                    .get(i)
                    .map(|movie| self.render(movie))
                    .ok_or_else(|| CineragError::Integrity(format!("no record at index {}", i)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Context::Records(blocks.join("\n\n")))
    }

    /// Render one movie as a single paragraph.
    pub fn render(&self, movie: &Movie) -> String {
        let or_unknown = |field: &Option<String>| -> String {
            field.as_deref().unwrap_or(&self.unknown).to_string()
        };
        let duration = match movie.duration.as_deref() {
            Some(minutes) => format!("{} minutos", minutes),
            None => self.unknown.clone(),
        };

        let fields = [
            ("Título", or_unknown(&movie.title)),
            ("Título original", or_unknown(&movie.original_title)),
            ("Año de publicación", or_unknown(&movie.year)),
            ("Fecha publicada", or_unknown(&movie.date_published)),
            ("Género", or_unknown(&movie.genre)),
            ("Duración", duration),
            ("País", or_unknown(&movie.country)),
            ("Idioma", or_unknown(&movie.language)),
            ("Director", or_unknown(&movie.director)),
            ("Guionista", or_unknown(&movie.writer)),
            ("Productora", or_unknown(&movie.production_company)),
            ("Actores principales", or_unknown(&movie.actors)),
            (
                "Descripción",
                movie
                    .description
                    .clone()
                    .unwrap_or_else(|| self.no_description.clone()),
            ),
            ("Voto promedio", or_unknown(&movie.avg_vote)),
            ("Cantidad de votos", or_unknown(&movie.votes)),
        ];

        fields
            .iter()
            .map(|(label, value)| format!("{}: {}.", label, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
