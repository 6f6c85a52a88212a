//! OpenAI and Azure OpenAI client construction.

use crate::config::{ProviderKind, Settings};
use crate::error::{CineragError, Result};
use async_openai::config::{AzureConfig, OpenAIConfig};
use async_openai::Client;
use std::time::Duration;

/// Default timeout for model API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Create an OpenAI client with a custom timeout.
///
/// The API key is read from `OPENAI_API_KEY` by `async_openai`.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client(timeout)?))
}

/// Create an OpenAI client with the default timeout.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an Azure OpenAI client bound to one deployment.
///
/// Azure routes by deployment rather than by model name, so the embedder and
/// the chat model each get their own client.
pub fn create_azure_client(settings: &Settings, deployment: &str) -> Result<Client<AzureConfig>> {
    let endpoint = settings
        .provider
        .azure_endpoint
        .as_deref()
        .ok_or_else(|| CineragError::Config("Azure endpoint is not configured".to_string()))?;
    let api_key = std::env::var(ProviderKind::Azure.api_key_var()).unwrap_or_default();

    let config = AzureConfig::new()
        .with_api_base(endpoint)
        .with_api_version(&settings.provider.azure_api_version)
        .with_deployment_id(deployment)
        .with_api_key(api_key);

    let timeout = Duration::from_secs(settings.provider.timeout_secs);
    Ok(Client::with_config(config).with_http_client(http_client(timeout)?))
}
