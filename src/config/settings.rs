//! Configuration settings for Cinerag.

use crate::error::{CineragError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub dataset: DatasetSettings,
    pub provider: ProviderSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.cinerag".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Location of the movie table and its precomputed embeddings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatasetSettings {
    /// CSV file with one movie per row. Defaults to `<data_dir>/csv/IMDb_movies.csv`.
    pub records_path: Option<String>,
    /// `.npy` or `.json` embeddings aligned with the CSV rows.
    /// Defaults to `<data_dir>/embeddings.npy`.
    pub embeddings_path: Option<String>,
    /// Where `cinerag fetch` downloads the CSV from.
    pub records_url: Option<String>,
    /// Where `cinerag fetch` downloads the embeddings from.
    pub embeddings_url: Option<String>,
}

/// Which OpenAI-compatible service hosts the models.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// api.openai.com, key from `OPENAI_API_KEY`.
    #[default]
    OpenAI,
    /// Azure OpenAI deployments, key from `AZURE_OPENAI_API_KEY`.
    Azure,
}

impl ProviderKind {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Azure => "AZURE_OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "azure" | "azure-openai" => Ok(ProviderKind::Azure),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Azure => write!(f, "azure"),
        }
    }
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub azure_endpoint: Option<String>,
    /// Azure REST API version.
    pub azure_api_version: String,
    /// HTTP timeout for every model call.
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenAI,
            azure_endpoint: None,
            azure_api_version: "2024-02-01".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Query embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model (deployment name on Azure). Must match the model the
    /// stored embeddings were computed with.
    pub model: String,
    /// Requested output dimensions. Only sent when set.
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: None,
        }
    }
}

/// Retrieval and answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chat model (deployment name on Azure).
    pub model: String,
    /// Number of records placed in the context.
    pub top_k: NonZeroUsize,
    /// Sampling temperature. Provider default when unset.
    pub temperature: Option<f32>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            top_k: NonZeroUsize::new(5).unwrap_or(NonZeroUsize::MIN),
            temperature: None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = Self::load_unchecked(&config_path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`Settings::load_from`] but without [`Settings::validate`], for
    /// commands that report on a broken configuration.
    pub fn load_unchecked(config_path: &Path) -> Result<Self> {
        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply deployment environment variables.
    ///
    /// `lookup` is injected so tests do not have to touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get("AZURE_OPENAI_ENDPOINT") {
            self.provider.kind = ProviderKind::Azure;
            self.provider.azure_endpoint = Some(endpoint);
        }
        if let Some(version) = get("AZURE_OPENAI_API_VERSION") {
            self.provider.azure_api_version = version;
        }
        if let Some(model) = get("AZURE_OPENAI_CHAT_MODEL") {
            self.rag.model = model;
        }
        if let Some(model) = get("AZURE_OPENAI_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(url) = get("MOVIES_CSV_URL") {
            self.dataset.records_url = Some(url);
        }
        if let Some(url) = get("EMBEDDINGS_NPY_URL") {
            self.dataset.embeddings_url = Some(url);
        }
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.provider.kind == ProviderKind::Azure
            && self
                .provider
                .azure_endpoint
                .as_deref()
                .map_or(true, |e| e.trim().is_empty())
        {
            return Err(CineragError::Config(
                "provider.kind = \"azure\" requires provider.azure_endpoint (or AZURE_OPENAI_ENDPOINT)"
                    .to_string(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(CineragError::Config(
                "provider.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CineragError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cinerag")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded path of the movie CSV.
    pub fn records_path(&self) -> PathBuf {
        match &self.dataset.records_path {
            Some(p) => Self::expand_path(p),
            None => self.data_dir().join("csv").join("IMDb_movies.csv"),
        }
    }

    /// Get the expanded path of the embeddings file.
    pub fn embeddings_path(&self) -> PathBuf {
        match &self.dataset.embeddings_path {
            Some(p) => Self::expand_path(p),
            None => self.data_dir().join("embeddings.npy"),
        }
    }
}
