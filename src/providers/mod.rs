mod anthropic;
mod factory;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use open_ai::OpenAIProvider;
pub use prompt::MEAL_PARSER_PROMPT;

use crate::error::ImportError;
use async_trait::async_trait;

/// Anything that can answer a prompt with free-form text.
///
/// The import pipeline only relies on getting a reply string back; which
/// model or transport produced it is up to the implementation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, ImportError>;
}

/// Read an error body for the log without failing on it.
async fn failure(provider: &str, response: reqwest::Response) -> ImportError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ImportError::Provider(format!(
        "{} request failed with status {}: {}",
        provider, status, body
    ))
}
