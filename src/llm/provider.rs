use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{AppError, LLMRequest, LLMResponse, AppResult};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_response(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for an LLM provider
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl LLMProviderConfig {
    pub fn openai(config: &LLMConfig) -> Self {
        Self {
            name: "openai".to_string(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

pub struct LLM {
    adapter: Box<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Box<dyn LLMAdapter> = match provider.name.as_str() {
            "openai" => Box::new(crate::llm::openai::OpenAIAdapter::new(
                &provider.api_key,
                &provider.base_url,
                provider.timeout_secs,
            )?),
            _ => {
                return Err(AppError::Config(format!(
                    "Unsupported provider: {}",
                    provider.name
                )))
            }
        };

        Ok(Self {
            adapter,
            provider_name: provider.name,
        })
    }

    /// Wrap an existing adapter, e.g. a scripted one in tests
    pub fn from_adapter(name: impl Into<String>, adapter: Box<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_response(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_response(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_provider() {
        let result = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".to_string(),
            api_key: "key".to_string(),
            base_url: "http://localhost".to_string(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_openai_provider() {
        let config = crate::config::Config::default().llm;
        let llm = LLM::new(LLMProviderConfig::openai(&config)).unwrap();
        assert_eq!(llm.provider_name(), "openai");
    }
}
