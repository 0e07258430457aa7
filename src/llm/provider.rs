use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for one LLM provider connection
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl From<&LLMConfig> for LLMProviderConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            name: config.provider.clone(),
            api_key: config.google_api_key.clone(),
            base_url: Some(config.google_api_base.clone()),
        }
    }
}

/// Cheaply clonable handle to the configured adapter
#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let kind = LLMProvider::from_id(&provider.name).ok_or_else(|| {
            AppError::InvalidRequest(format!("Unsupported provider: {}", provider.name))
        })?;

        let adapter: Arc<dyn LLMAdapter> = match kind {
            LLMProvider::Google => Arc::new(match provider.base_url {
                Some(base_url) => {
                    crate::llm::google::GoogleAdapter::with_base_url(&provider.api_key, &base_url)
                }
                None => crate::llm::google::GoogleAdapter::new(&provider.api_key),
            }),
        };

        Ok(Self {
            adapter,
            provider_name: kind.to_string(),
        })
    }

    /// Wrap an existing adapter, e.g. a scripted one in tests
    pub fn from_adapter(adapter: Arc<dyn LLMAdapter>, provider_name: impl Into<String>) -> Self {
        Self {
            adapter,
            provider_name: provider_name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_google_adapter() {
        let llm = LLM::new(LLMProviderConfig {
            name: "gemini".to_string(),
            api_key: "test-key".to_string(),
            base_url: None,
        })
        .unwrap();
        assert_eq!(llm.provider_name(), "google");
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let result = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".to_string(),
            api_key: String::new(),
            base_url: None,
        });
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
