//! Configuration module for Cinerag.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    DatasetSettings, EmbeddingSettings, GeneralSettings, PromptSettings, ProviderKind,
    ProviderSettings, RagSettings, ServerSettings, Settings,
};
