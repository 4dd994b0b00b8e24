use crate::config::{AppConfig, ProviderConfig};
use crate::error::ImportError;
use crate::providers::{AnthropicProvider, CompletionProvider, OpenAIProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn CompletionProvider>, ImportError> {
        if !config.enabled {
            return Err(ImportError::Provider(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }

        match provider_name {
            "openai" => Ok(Box::new(OpenAIProvider::new(config, timeout)?)),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(config, timeout)?)),
            _ => Err(ImportError::Provider(format!(
                "Unknown provider: {}",
                provider_name
            ))),
        }
    }

    /// Create the named provider, or the configured default when `name` is `None`.
    pub fn from_config(
        config: &AppConfig,
        name: Option<&str>,
    ) -> Result<Box<dyn CompletionProvider>, ImportError> {
        let provider_name = name.unwrap_or(config.default_provider.as_str());
        Self::create(
            provider_name,
            &config.provider(provider_name),
            Duration::from_secs(config.timeout),
        )
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "anthropic"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn create_test_provider_config() -> ProviderConfig {
        ProviderConfig {
            api_key: Some("test-key".to_string()),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_create_openai_provider() {
        let config = create_test_provider_config();
        let provider = ProviderFactory::create("openai", &config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_create_anthropic_provider() {
        let config = create_test_provider_config();
        let provider =
            ProviderFactory::create("anthropic", &config, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = create_test_provider_config();
        let result = ProviderFactory::create("unknown", &config, Duration::from_secs(5));
        match result {
            Err(e) => assert!(e.to_string().contains("Unknown provider")),
            Ok(_) => panic!("unknown provider should not be created"),
        }
    }

    #[test]
    fn test_create_disabled_provider() {
        let mut config = create_test_provider_config();
        config.enabled = false;

        let result = ProviderFactory::create("openai", &config, Duration::from_secs(5));
        match result {
            Err(e) => assert!(e.to_string().contains("not enabled in configuration")),
            Ok(_) => panic!("disabled provider should not be created"),
        }
    }

    #[test]
    fn test_from_config_uses_default_provider() {
        let mut providers = HashMap::new();
        providers.insert("anthropic".to_string(), create_test_provider_config());

        let config = AppConfig {
            default_provider: "anthropic".to_string(),
            providers,
            ..AppConfig::default()
        };

        let provider = ProviderFactory::from_config(&config, None).unwrap();
        assert_eq!(provider.provider_name(), "anthropic");
    }

    #[test]
    fn test_available_providers() {
        let providers = ProviderFactory::available_providers();
        assert_eq!(providers, vec!["openai", "anthropic"]);
    }
}
