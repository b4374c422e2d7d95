//! LLM Router
//!
//! Sends each request to the selected provider first and falls back to the
//! remaining ones in registration order. Every attempt is bounded by the
//! configured per-call timeout. The router itself implements `LLMProvider`,
//! so the planner and processor never know how many backends sit behind it.

use super::anthropic::AnthropicProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAIProvider;
use super::{LLMError, LLMProvider, Message, ModelSelector};
use crate::config::LLMConfig;
use crate::secrets::SecretManager;
use async_trait::async_trait;
use sdk::errors::EngineError;
use std::time::Duration;

/// LLM Router with ordered failover
pub struct LLMRouter {
    /// Providers in attempt order (selected provider first)
    providers: Vec<Box<dyn LLMProvider>>,

    /// Upper bound for a single provider attempt
    call_timeout: Duration,
}

impl LLMRouter {
    /// Create a router from already-constructed providers.
    ///
    /// The provider named `preferred` is moved to the front; the relative
    /// order of the others is kept.
    pub fn new(
        mut providers: Vec<Box<dyn LLMProvider>>,
        preferred: &str,
        call_timeout: Duration,
    ) -> Self {
        if let Some(pos) = providers.iter().position(|p| p.name() == preferred) {
            let selected = providers.remove(pos);
            providers.insert(0, selected);
        }
        Self {
            providers,
            call_timeout,
        }
    }

    /// Build the router from configuration.
    ///
    /// Cloud providers are registered only when their API key resolves.
    /// Ollama needs no key and is always registered. A `selector` overrides
    /// the default provider and, optionally, that provider's model.
    pub fn from_config(
        config: &LLMConfig,
        secrets: &SecretManager,
        selector: Option<&ModelSelector>,
    ) -> Result<Self, EngineError> {
        let timeout = Duration::from_secs(config.call_timeout_secs);
        let preferred = selector
            .map(|s| s.provider.as_str())
            .unwrap_or(config.default_provider.as_str());
        let model_override = |provider: &str| {
            selector
                .filter(|s| s.provider == provider)
                .and_then(|s| s.model.clone())
        };

        let mut providers: Vec<Box<dyn LLMProvider>> = Vec::new();

        let mut openai = config.openai.clone();
        if let Some(model) = model_override("openai") {
            openai.model = model;
        }
        match secrets.get_secret("openai_api_key") {
            Ok(key) => providers.push(Box::new(OpenAIProvider::new(openai, key, timeout))),
            Err(e) if preferred == "openai" => return Err(e),
            Err(e) => tracing::debug!("OpenAI provider not registered: {}", e),
        }

        let mut anthropic = config.anthropic.clone();
        if let Some(model) = model_override("anthropic") {
            anthropic.model = model;
        }
        match secrets.get_secret("anthropic_api_key") {
            Ok(key) => providers.push(Box::new(AnthropicProvider::new(anthropic, key, timeout))),
            Err(e) if preferred == "anthropic" => return Err(e),
            Err(e) => tracing::debug!("Anthropic provider not registered: {}", e),
        }

        let ollama_model = model_override("ollama").unwrap_or_else(|| config.ollama.model.clone());
        providers.push(Box::new(OllamaProvider::new(
            config.ollama.base_url.clone(),
            ollama_model,
            timeout,
        )));

        let router = Self::new(providers, preferred, timeout);
        tracing::info!(
            "LLM router ready: {}",
            router.provider_names().join(" -> ")
        );
        Ok(router)
    }

    /// Provider names in attempt order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Call providers in order until one succeeds.
    ///
    /// Returns the response together with the name of the provider that
    /// produced it.
    pub async fn call(&self, messages: &[Message]) -> super::Result<(String, String)> {
        if self.providers.is_empty() {
            return Err(LLMError::ProviderUnavailable(
                "No LLM providers configured".to_string(),
            ));
        }

        let mut last_error = None;
        for provider in &self.providers {
            tracing::debug!(
                "Attempting provider: {} (timeout: {}s)",
                provider.name(),
                self.call_timeout.as_secs()
            );

            let result = tokio::time::timeout(self.call_timeout, provider.generate(messages)).await;

            match result {
                Ok(Ok(response)) => {
                    tracing::debug!("Provider {} succeeded", provider.name());
                    return Ok((response, provider.name().to_string()));
                }
                Ok(Err(e)) => {
                    tracing::warn!("Provider {} failed: {}", provider.name(), e);
                    last_error = Some(e);
                }
                Err(_) => {
                    tracing::warn!(
                        "Provider {} timed out after {}s",
                        provider.name(),
                        self.call_timeout.as_secs()
                    );
                    last_error = Some(LLMError::Timeout);
                }
            }
        }

        tracing::error!("All LLM providers exhausted");
        Err(LLMError::ProviderUnavailable(format!(
            "All LLM providers failed (last error: {})",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Check the health of all registered providers
    /// Returns a list of (provider_name, is_healthy)
    pub async fn check_health(&self) -> Vec<(&str, bool)> {
        let mut results = Vec::new();
        for provider in &self.providers {
            let is_healthy = provider.check_health().await;
            results.push((provider.name(), is_healthy));
        }
        results
    }
}

#[async_trait]
impl LLMProvider for LLMRouter {
    fn name(&self) -> &str {
        "router"
    }

    fn is_local(&self) -> bool {
        self.providers.first().map(|p| p.is_local()).unwrap_or(false)
    }

    async fn generate(&self, messages: &[Message]) -> super::Result<String> {
        self.call(messages).await.map(|(response, _)| response)
    }
}
