//! Google Gemini API provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::GenUiError;
use crate::types::{ConversationTurn, Role, ToolCall, TurnPart};

use super::http::shared_client;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    model_id: String,
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = request
            .conversation
            .iter()
            .filter_map(build_gemini_content)
            .collect();

        let mut obj = serde_json::Map::new();
        obj.insert("contents".into(), serde_json::Value::Array(contents));

        if let Some(system) = &request.system_instruction {
            obj.insert(
                "systemInstruction".into(),
                serde_json::json!({ "parts": [{ "text": system }] }),
            );
        }

        let mut gen_config = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if request.include_thoughts {
            gen_config.insert(
                "thinkingConfig".into(),
                serde_json::json!({ "includeThoughts": true }),
            );
        }
        if !gen_config.is_empty() {
            obj.insert("generationConfig".into(), serde_json::Value::Object(gen_config));
        }

        if let Some(declarations) = &request.tool_declarations {
            if !declarations.is_empty() {
                let fn_decls: Vec<serde_json::Value> = declarations
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "name": d.name,
                            "description": d.description,
                            "parameters": d.parameters,
                        })
                    })
                    .collect();
                obj.insert(
                    "tools".into(),
                    serde_json::json!([{ "functionDeclarations": fn_decls }]),
                );
            }
        }

        serde_json::Value::Object(obj)
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, GenUiError> {
        let body = self.build_request_body(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model_id);

        debug!(
            model = %self.model_id,
            turns = request.conversation.len(),
            "Google generate"
        );

        let resp = shared_client()
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(super::http::status_to_error(status, &body_text));
        }

        let data: GeminiResponse = resp.json().await?;
        parse_gemini_response(data)
    }
}

fn build_gemini_content(turn: &ConversationTurn) -> Option<serde_json::Value> {
    let parts: Vec<serde_json::Value> = turn
        .parts
        .iter()
        .filter_map(|part| match part {
            TurnPart::Text { text } => Some(serde_json::json!({ "text": text })),
            TurnPart::Thought { .. } => None,
            TurnPart::ToolCall(call) => Some(serde_json::json!({
                "functionCall": {
                    "name": call.name,
                    "args": call.arguments,
                }
            })),
            TurnPart::ToolResult(result) => Some(serde_json::json!({
                "functionResponse": {
                    "name": result.name,
                    "response": wrap_function_response(&result.result),
                }
            })),
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
    };
    Some(serde_json::json!({ "role": role, "parts": parts }))
}

/// `functionResponse.response` must be a JSON object.
fn wrap_function_response(result: &serde_json::Value) -> serde_json::Value {
    if result.is_object() {
        result.clone()
    } else {
        serde_json::json!({ "result": result })
    }
}

fn parse_gemini_response(data: GeminiResponse) -> Result<ProviderResponse, GenUiError> {
    if let Some(reason) = data.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenUiError::Provider {
            provider: "google".into(),
            message: format!("prompt blocked: {reason}"),
        });
    }

    let candidate = data
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenUiError::api(200, "No candidates in Gemini response"))?;

    let mut text = String::new();
    let mut thinking = String::new();
    let mut tool_calls = Vec::new();

    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(t) = part.text {
            if part.thought {
                thinking.push_str(&t);
            } else {
                text.push_str(&t);
            }
        }
        if let Some(fc) = part.function_call {
            tool_calls.push(ToolCall::new(
                fc.name,
                fc.args
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
            ));
        }
    }

    if text.is_empty() && tool_calls.is_empty() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                return Err(GenUiError::Provider {
                    provider: "google".into(),
                    message: format!("empty candidate (finish reason {reason})"),
                });
            }
        }
    }

    Ok(ProviderResponse {
        text: (!text.is_empty()).then_some(text),
        thinking: (!thinking.is_empty()).then_some(thinking),
        tool_calls,
    })
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolDeclaration;
    use crate::types::ToolResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_body_maps_calls_and_results() {
        let provider = GoogleProvider::new("gemini-test", "key");
        let request = ProviderRequest::builder()
            .conversation(vec![
                ConversationTurn::user("List urgent todos"),
                ConversationTurn::tool_call(ToolCall::new(
                    "listTodos",
                    serde_json::json!({"priority": "urgent"}),
                )),
                ConversationTurn::tool_result(ToolResult::success(
                    "listTodos",
                    serde_json::json!([{"id": "1"}]),
                )),
            ])
            .tool_declarations(vec![ToolDeclaration {
                name: "listTodos".into(),
                description: "List todos".into(),
                parameters: serde_json::json!({"type": "object"}),
            }])
            .temperature(0.2)
            .system_instruction("be helpful".to_string())
            .include_thoughts(true)
            .build();

        let body = provider.build_request_body(&request);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "listTodos");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"],
            serde_json::json!({"result": [{"id": "1"}]})
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be helpful");
        assert_eq!(body["generationConfig"]["thinkingConfig"]["includeThoughts"], true);
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "listTodos"
        );
    }

    #[test]
    fn thought_parts_are_not_sent() {
        let provider = GoogleProvider::new("gemini-test", "key");
        let request = ProviderRequest::builder()
            .conversation(vec![ConversationTurn {
                role: Role::Model,
                parts: vec![TurnPart::Thought {
                    text: "hmm".into(),
                }],
                timestamp: None,
            }])
            .build();
        let body = provider.build_request_body(&request);
        assert_eq!(body["contents"], serde_json::json!([]));
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn parses_text_thoughts_and_calls() {
        let data: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Thinking about todos", "thought": true},
                    {"functionCall": {"name": "listTodos", "args": {"priority": "high"}}},
                    {"functionCall": {"name": "render"}}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        let response = parse_gemini_response(data).unwrap();
        assert_eq!(response.thinking.as_deref(), Some("Thinking about todos"));
        assert_eq!(response.text, None);
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments["priority"], "high");
        assert_eq!(response.tool_calls[1].arguments, serde_json::json!({}));
    }

    #[test]
    fn blocked_prompt_is_a_provider_error() {
        let data: GeminiResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = parse_gemini_response(data).unwrap_err();
        assert!(matches!(err, GenUiError::Provider { .. }));
    }
}
