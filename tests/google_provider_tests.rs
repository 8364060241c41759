//! Gemini REST provider against a mock server.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use genui::error::GenUiError;
use genui::provider::google::GoogleProvider;
use genui::provider::{ModelProvider, ProviderRequest, ToolDeclaration};
use genui::types::{ConversationTurn, ToolCall, ToolResult};

const GENERATE_PATH: &str = "/models/gemini-test:generateContent";

fn provider(server: &MockServer) -> GoogleProvider {
    GoogleProvider::new("gemini-test", "test-key").with_base_url(server.uri())
}

fn request(conversation: Vec<ConversationTurn>) -> ProviderRequest {
    ProviderRequest::builder()
        .conversation(conversation)
        .system_instruction("be brief".to_string())
        .temperature(0.2)
        .include_thoughts(true)
        .tool_declarations(vec![ToolDeclaration {
            name: "listTodos".into(),
            description: "List todos".into(),
            parameters: json!({"type": "object", "properties": {}}),
        }])
        .build()
}

#[tokio::test]
async fn parses_text_thoughts_and_function_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "generationConfig": {"temperature": 0.2, "thinkingConfig": {"includeThoughts": true}},
            "tools": [{"functionDeclarations": [{"name": "listTodos"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Looking at urgent items.", "thought": true},
                    {"text": "Let me check."},
                    {"functionCall": {"name": "listTodos", "args": {"priority": "urgent"}}}
                ]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate(&request(vec![ConversationTurn::user("urgent todos?")]))
        .await
        .unwrap();

    assert_eq!(response.text.as_deref(), Some("Let me check."));
    assert_eq!(response.thinking.as_deref(), Some("Looking at urgent items."));
    assert_eq!(
        response.tool_calls,
        vec![ToolCall::new("listTodos", json!({"priority": "urgent"}))]
    );
}

#[tokio::test]
async fn sends_paired_call_and_result_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "delete it"}]},
                {"role": "model", "parts": [{"functionCall": {"name": "deleteTodo", "args": {"id": "1"}}}]},
                {"role": "user", "parts": [{"functionResponse": {"name": "deleteTodo", "response": {"result": [1, 2]}}}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Deleted."}]}, "finishReason": "STOP"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = vec![
        ConversationTurn::user("delete it"),
        ConversationTurn::tool_call(ToolCall::new("deleteTodo", json!({"id": "1"}))),
        ConversationTurn::tool_result(ToolResult::success("deleteTodo", json!([1, 2]))),
    ];
    let response = provider(&server).generate(&request(conversation)).await.unwrap();
    assert_eq!(response.text.as_deref(), Some("Deleted."));
    assert!(response.tool_calls.is_empty());
}

#[tokio::test]
async fn maps_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"error": {"message": "API key not valid"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "slow down"}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let provider = provider(&server);
    let req = request(vec![ConversationTurn::user("hi")]);

    let err = provider.generate(&req).await.unwrap_err();
    assert!(matches!(err, GenUiError::Authentication(ref m) if m == "API key not valid"));

    let err = provider.generate(&req).await.unwrap_err();
    assert!(matches!(err, GenUiError::RateLimited { .. }));

    let err = provider.generate(&req).await.unwrap_err();
    assert!(matches!(err, GenUiError::Api { status: 500, ref message } if message == "internal"));
}

#[tokio::test]
async fn blocked_prompt_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate(&request(vec![ConversationTurn::user("hi")]))
        .await
        .unwrap_err();
    assert!(matches!(err, GenUiError::Provider { ref message, .. } if message.contains("SAFETY")));
}
