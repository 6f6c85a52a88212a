//! Cinerag - question answering over a movie catalog
//!
//! Answers natural-language questions about a table of movies by retrieving
//! the records whose precomputed embeddings are most similar to the question
//! and asking a chat model to answer from those records only.
//!
//! # Architecture
//!
//! - `catalog` - Movie records and their aligned embedding index
//! - `embedding` - Query embedding providers
//! - `llm` - Chat completion providers
//! - `rag` - Similarity ranking, context assembly and answer generation
//! - `dataset` - Downloading the catalog files
//! - `config` - Settings and prompt templates
//! - `cli` - Command-line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use cinerag::config::Settings;
//! use cinerag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let service = RagService::from_settings(&settings, None).await?;
//!
//!     let answer = service.ask("¿Quién dirigió Heat?").await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod rag;

pub use error::{CineragError, Result};
