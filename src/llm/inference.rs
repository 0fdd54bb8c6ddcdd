//! OpenAI-compatible chat completions with tool use (function calling).

use crate::tools::ToolDefinition;
use crate::types::*;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Anything that can answer a conversation, possibly with tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<InferenceResponse>;
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Client for a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    settings: InferenceSettings,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolPayload<'a>>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    role: ChatRole,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolPayload<'a> {
    r#type: &'a str,
    function: FunctionPayload<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionPayload<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCallPayload {
    id: String,
    r#type: String,
    function: FunctionCallPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCallPayload {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct UsagePayload {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl InferenceClient {
    pub fn new(base_url: &str, api_key: &str, settings: InferenceSettings, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build inference HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            settings,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[async_trait]
impl ChatModel for InferenceClient {
    async fn chat(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Result<InferenceResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.settings.model,
            messages: messages.iter().map(message_payload).collect(),
            tools: tool_payloads(tools),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        debug!("Inference request to model: {}", self.settings.model);

        let mut req = self.http.post(&url).json(&request);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        let resp = req.send().await.context("Inference request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Inference failed ({}): {}",
                status,
                crate::text::truncate_chars(&body, 500)
            );
        }

        let body: ChatResponse = resp.json().await.context("Failed to parse inference response")?;
        let response = into_response(body);
        debug!("Inference used {} tokens", response.usage.total_tokens);
        Ok(response)
    }
}

fn message_payload(m: &ChatMessage) -> MessagePayload {
    let tool_calls = (!m.tool_calls.is_empty()).then(|| {
        m.tool_calls
            .iter()
            .map(|tc| ToolCallPayload {
                id: tc.id.clone(),
                r#type: "function".into(),
                function: FunctionCallPayload {
                    name: tc.name.clone(),
                    arguments: match &tc.arguments {
                        serde_json::Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    },
                },
            })
            .collect()
    });

    // Assistant messages that only carry tool calls have null content.
    let content = if m.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(m.content.clone())
    };

    MessagePayload {
        role: m.role,
        content,
        tool_calls,
        tool_call_id: m.tool_call_id.clone(),
    }
}

fn tool_payloads(tools: &[ToolDefinition]) -> Option<Vec<ToolPayload<'_>>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|t| ToolPayload {
                r#type: "function",
                function: FunctionPayload {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect(),
    )
}

fn into_response(body: ChatResponse) -> InferenceResponse {
    let usage = body
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    let Some(choice) = body.choices.into_iter().next() else {
        return InferenceResponse {
            content: None,
            tool_calls: Vec::new(),
            usage,
        };
    };

    // Unparsable arguments stay a raw string so validation rejects the call.
    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| {
            let arguments = serde_json::from_str(&tc.function.arguments)
                .unwrap_or(serde_json::Value::String(tc.function.arguments));
            ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments,
            }
        })
        .collect();

    InferenceResponse {
        content: choice.message.content,
        tool_calls,
        usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assistant_tool_calls_are_sent_back() {
        let mut msg = ChatMessage::assistant("");
        msg.tool_calls.push(ToolCall {
            id: "call_1".into(),
            name: "web_search".into(),
            arguments: json!({"query": "rust"}),
        });

        let payload = serde_json::to_value(message_payload(&msg)).unwrap();
        assert_eq!(payload["role"], "assistant");
        assert!(payload["content"].is_null());
        assert_eq!(payload["tool_calls"][0]["function"]["name"], "web_search");
        assert_eq!(payload["tool_calls"][0]["function"]["arguments"], "{\"query\":\"rust\"}");

        let reply = serde_json::to_value(message_payload(&ChatMessage::tool("call_1", "ok"))).unwrap();
        assert_eq!(reply["role"], "tool");
        assert_eq!(reply["tool_call_id"], "call_1");
        assert!(reply.get("tool_calls").is_none());
    }

    #[test]
    fn response_tool_calls_are_parsed() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function",
                         "function": {"name": "summarize", "arguments": "{\"text\":\"x\"}"}},
                        {"id": "b", "type": "function",
                         "function": {"name": "query_logs", "arguments": "not json"}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        let response = into_response(body);
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments, json!({"text": "x"}));
        assert_eq!(response.tool_calls[1].arguments, json!("not json"));

        // The raw text goes back to the model unchanged.
        let mut echoed = ChatMessage::assistant("");
        echoed.tool_calls = response.tool_calls.clone();
        let payload = serde_json::to_value(message_payload(&echoed)).unwrap();
        assert_eq!(payload["tool_calls"][1]["function"]["arguments"], "not json");
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn empty_choices_yield_empty_response() {
        let body: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let response = into_response(body);
        assert!(response.content.is_none());
        assert!(response.tool_calls.is_empty());
    }
}
