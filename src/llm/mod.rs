//! Language model abstraction for answer generation.

mod openai;

pub use openai::OpenAIChatModel;

use crate::config::{ProviderKind, Settings};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Speaker of a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message sent to a language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Generates text from an ordered list of turns.
///
/// Failures are reported as [`crate::CineragError::Generation`] and are not
/// retried here.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String>;

    /// Model identifier, for logs and diagnostics.
    fn model(&self) -> &str;
}

/// Build the configured chat model. `model` overrides `rag.model` when given.
pub fn from_settings(settings: &Settings, model: Option<&str>) -> Result<Arc<dyn LanguageModel>> {
    let model = model.unwrap_or(&settings.rag.model);
    let temperature = settings.rag.temperature;

    let llm: Arc<dyn LanguageModel> = match settings.provider.kind {
        ProviderKind::OpenAI => Arc::new(OpenAIChatModel::new(
            crate::openai::create_client_with_timeout(std::time::Duration::from_secs(
                settings.provider.timeout_secs,
            ))?,
            model,
            temperature,
        )),
        ProviderKind::Azure => Arc::new(OpenAIChatModel::new(
            crate::openai::create_azure_client(settings, model)?,
            model,
            temperature,
        )),
    };
    Ok(llm)
}
