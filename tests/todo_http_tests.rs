//! HTTP todo client and site executor against a mock todo service.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use genui::error::GenUiError;
use genui::tools::{
    HttpTodoApi, SiteToolExecutor, TodoApi, TodoFilter, TodoPriority, TodoStatus, ToolExecutor,
};
use genui::types::ToolCall;

fn todo(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("todo {id}"),
        "status": status,
        "priority": "high",
        "tags": ["home"],
        "createdAt": "2026-01-05T10:00:00Z"
    })
}

fn api(server: &MockServer) -> HttpTodoApi {
    HttpTodoApi::new(&format!("{}/api", server.uri())).unwrap()
}

#[tokio::test]
async fn list_sends_filter_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/todos"))
        .and(query_param("priority", "high"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([todo("1", "pending")])))
        .expect(1)
        .mount(&server)
        .await;

    let todos = api(&server)
        .list_todos(TodoFilter {
            status: Some(TodoStatus::Pending),
            priority: Some(TodoPriority::High),
            search: None,
        })
        .await
        .unwrap();

    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].priority, TodoPriority::High);
    assert_eq!(todos[0].tags, vec!["home".to_string()]);
}

#[tokio::test]
async fn not_found_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/todos/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Todo not found"})))
        .mount(&server)
        .await;

    let err = api(&server).get_todo("42").await.unwrap_err();
    assert!(matches!(err, GenUiError::Api { status: 404, ref message } if message == "Todo not found"));
}

#[tokio::test]
async fn bulk_status_posts_ids_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/todos/bulk/status"))
        .and(body_json(json!({"ids": ["1", "2"], "status": "completed"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"affected": 2, "ids": ["1", "2"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = api(&server)
        .bulk_update_status(&["1".into(), "2".into()], TodoStatus::Completed)
        .await
        .unwrap();
    assert_eq!(outcome.affected, 2);
}

#[tokio::test]
async fn executor_reports_site_failures_as_results() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/todos/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(todo("7", "completed")))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/todos/8"))
        .and(body_json(json!({"status": "in_progress"})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Todo not found"})))
        .mount(&server)
        .await;

    let executor = SiteToolExecutor::new(Arc::new(api(&server)));

    let deleted = executor
        .execute(&ToolCall::new("deleteTodo", json!({"id": "7"})))
        .await;
    assert!(!deleted.is_error());
    assert_eq!(deleted.result["id"], "7");
    assert_eq!(deleted.result["status"], "completed");

    let missing = executor
        .execute(&ToolCall::new(
            "updateTodo",
            json!({"id": "8", "status": "in_progress"}),
        ))
        .await;
    assert_eq!(
        missing.error_message(),
        Some("API error (status 404): Todo not found")
    );
}

#[tokio::test]
async fn unreachable_service_is_an_error_result() {
    let api = HttpTodoApi::new("http://127.0.0.1:1/api").unwrap();
    let executor = SiteToolExecutor::new(Arc::new(api));
    let result = executor
        .execute(&ToolCall::new("listTodos", json!({})))
        .await;
    assert!(result.error_message().unwrap().starts_with("Network error"));
}
