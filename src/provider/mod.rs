//! Reasoning-provider boundary and the stateful conversation client.

pub mod client;
pub mod http;

#[cfg(feature = "google")]
pub mod google;

pub use client::ProviderClient;

use std::sync::Arc;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::config::GenUiConfig;
use crate::error::GenUiError;
use crate::types::{ConversationTurn, ToolCall};

/// A request sent to a model provider.
#[derive(Debug, Clone, Builder)]
pub struct ProviderRequest {
    pub conversation: Vec<ConversationTurn>,
    pub tool_declarations: Option<Vec<ToolDeclaration>>,
    pub temperature: Option<f64>,
    pub system_instruction: Option<String>,
    /// Ask the provider to return its reasoning trace.
    #[builder(default)]
    pub include_thoughts: bool,
}

/// Tool declaration sent to the provider API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    pub text: Option<String>,
    pub thinking: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ProviderResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }

    pub fn with_thinking(mut self, thinking: impl Into<String>) -> Self {
        self.thinking = Some(thinking.into());
        self
    }
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "google").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// One non-streaming request/response round trip.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenUiError>;
}

/// Create a provider for the given model, using the provided config.
#[allow(unused_variables)]
pub fn create_provider(
    model_id: &str,
    config: &GenUiConfig,
) -> Result<Arc<dyn ModelProvider>, GenUiError> {
    #[cfg(feature = "google")]
    {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| GenUiError::Authentication("Missing GEMINI_API_KEY".into()))?;
        let mut provider = google::GoogleProvider::new(model_id, api_key);
        if let Some(base_url) = &config.gemini_base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        Ok(Arc::new(provider))
    }
    #[cfg(not(feature = "google"))]
    {
        Err(GenUiError::Configuration(format!(
            "No provider enabled via feature flags for model '{model_id}'"
        )))
    }
}

#[cfg(all(test, feature = "google"))]
mod tests {
    use super::*;

    #[test]
    fn create_provider_requires_api_key() {
        let err = create_provider("gemini-2.5-flash", &GenUiConfig::default())
            .err()
            .expect("missing key must fail");
        assert!(matches!(err, GenUiError::Authentication(_)));
    }

    #[test]
    fn create_provider_uses_model_id() {
        let config = GenUiConfig::default().with_api_key("k");
        let provider = create_provider("gemini-2.5-pro", &config).unwrap();
        assert_eq!(provider.model_id(), "gemini-2.5-pro");
        assert_eq!(provider.provider_name(), "google");
    }
}
