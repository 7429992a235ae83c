// OpenAI adapter built on the Responses API
// API Reference: https://platform.openai.com/docs/api-reference/responses
//
// The Responses API is the only OpenAI endpoint that exposes the hosted
// web search tool, which patent discovery depends on.

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, SearchContextSize, TokenUsage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct OpenAIAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

// Request types
#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum Tool {
    #[serde(rename = "web_search_preview")]
    WebSearchPreview { search_context_size: SearchContextSize },
}

// Response types
#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<ResponsesUsage>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponsesUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Deserialize)]
struct OpenAIError {
    message: String,
    code: Option<String>,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Concatenate every `output_text` part of every message item
    fn output_text(response: &ResponsesResponse) -> String {
        response
            .output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.content_type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn status_error(status: StatusCode, body: &str) -> AppError {
        let detail = match serde_json::from_str::<OpenAIErrorResponse>(body) {
            Ok(parsed) => format!(
                "{} (code: {})",
                parsed.error.message,
                parsed.error.code.as_deref().unwrap_or("none")
            ),
            Err(_) => body.to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::Auth(format!("OpenAI rejected the API key ({}): {}", status, detail))
            }
            _ => AppError::LLMApi(format!("OpenAI API error ({}): {}", status, detail)),
        }
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_response(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let url = format!("{}/responses", self.base_url);

        let body = ResponsesRequest {
            model: &request.model,
            input: request
                .messages
                .iter()
                .map(|m| InputMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            tools: request
                .web_search
                .iter()
                .map(|opts| Tool::WebSearchPreview {
                    search_context_size: opts.search_context_size,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::LLMApi(format!("OpenAI request timed out: {}", e))
                } else {
                    AppError::LLMApi(format!("OpenAI request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, &error_text));
        }

        let parsed: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLMApi(format!("Failed to parse OpenAI response: {}", e)))?;

        let content = Self::output_text(&parsed);
        debug!(chars = content.len(), "OpenAI response text extracted");

        let usage = parsed
            .usage
            .as_ref()
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            finish_reason: parsed.status.unwrap_or_else(|| "completed".to_string()),
            usage,
        })
    }
}
