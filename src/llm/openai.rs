//! OpenAI chat completions client
//!
//! Async HTTP client for `/chat/completions` with function calling. Works with
//! any gateway that speaks the same wire format.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Config, CrewError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    debug: bool,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: ResponseFunction,
}

/// Arguments arrive as a JSON-encoded string
#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiClient {
    /// Create a client from configuration.
    ///
    /// Fails when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .openai
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CrewError::config("OPENAI_API_KEY is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.completions_url(),
            api_key,
            debug: config.agent.debug,
        })
    }

    /// Debug log if enabled
    fn debug_log(&self, label: &str, content: &str) {
        if self.debug {
            let shown: String = content.chars().take(500).collect();
            tracing::debug!(label, body = %shown, "openai exchange");
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<LLMResponse> {
        self.debug_log("request", &serde_json::to_string(request)?);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    CrewError::llm(format!("Cannot connect to {}", self.endpoint))
                } else if e.is_timeout() {
                    CrewError::llm("Chat completion request timed out")
                } else {
                    CrewError::from(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        self.debug_log("response", &body);

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        parse_response(&body)
    }
}

fn map_http_error(status: StatusCode, body: &str) -> CrewError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());

    CrewError::llm(format!("API error ({}): {}", status, message))
}

fn parse_response(body: &str) -> Result<LLMResponse> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CrewError::llm(format!("Failed to parse response: {}", e)))?;

    let message = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| CrewError::llm("Response contained no choices"))?;

    // Undecodable arguments stay with the call so the agent can report them
    // back to the model instead of failing the task.
    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            if tc.function.arguments.trim().is_empty() {
                return ToolCall::new(tc.function.name, serde_json::json!({}));
            }
            match serde_json::from_str(&tc.function.arguments) {
                Ok(arguments) => ToolCall::new(tc.function.name, arguments),
                Err(e) => {
                    tracing::warn!(tool = %tc.function.name, error = %e, "malformed tool arguments");
                    ToolCall::malformed(tc.function.name, e.to_string())
                }
            }
        })
        .collect();

    Ok(LLMResponse {
        content: message.content.unwrap_or_default(),
        tool_calls,
        usage: parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        model: parsed.model,
    })
}

#[async_trait]
impl LLMProvider for OpenAiClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages,
            tools: None,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop,
        };

        self.send(&request).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages,
            tools: (!tools.is_empty()).then_some(tools),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stop: options.stop,
        };

        self.send(&request).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> Config {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-test".to_string());
        config.openai.base_url = "https://api.openai.com/v1".to_string();
        config
    }

    #[test]
    fn test_client_creation() {
        let client = OpenAiClient::from_config(&config_with_key()).unwrap();
        assert_eq!(client.endpoint, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_client_requires_key() {
        let mut config = config_with_key();
        config.openai.api_key = None;
        assert!(matches!(
            OpenAiClient::from_config(&config),
            Err(CrewError::Config(_))
        ));
    }

    #[test]
    fn test_parse_text_response() {
        let body = r#"{
            "model": "gpt-4",
            "choices": [{"message": {"role": "assistant", "content": "aws s3 ls"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        }"#;

        let response = parse_response(body).unwrap();
        assert_eq!(response.content, "aws s3 ls");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.usage.unwrap().total_tokens, 14);
    }

    #[test]
    fn test_parse_tool_call_response() {
        let body = r#"{
            "model": "gpt-4",
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "web_search", "arguments": "{\"query\": \"s3 bucket policy enumeration\"}"}
                }]
            }}]
        }"#;

        let response = parse_response(body).unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "web_search");
        assert_eq!(
            response.tool_calls[0].get_string("query").as_deref(),
            Some("s3 bucket policy enumeration")
        );
    }

    #[test]
    fn test_parse_malformed_tool_arguments() {
        let body = r#"{
            "model": "gpt-4",
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "web_search", "arguments": "{\"query\": \"iam"}
                }]
            }}]
        }"#;

        let response = parse_response(body).unwrap();
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "web_search");
        assert!(response.tool_calls[0].argument_error.is_some());
        assert!(response.tool_calls[0].get_string("query").is_none());
    }

    #[test]
    fn test_parse_empty_choices() {
        let err = parse_response(r#"{"model": "gpt-4", "choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_map_http_error_uses_api_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let err = map_http_error(StatusCode::UNAUTHORIZED, body);
        assert!(err.to_string().contains("Incorrect API key provided"));

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("upstream down"));
    }
}
