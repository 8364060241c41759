//! `reqwest` client for the todo service.

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::GenUiError;
use crate::provider::http::{shared_client, status_to_error};

use super::site::{BulkOutcome, CreateTodo, Todo, TodoApi, TodoFilter, TodoStatus, UpdateTodo};

/// Todo service reached over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    base_url: Url,
}

impl HttpTodoApi {
    pub fn new(base_url: &str) -> Result<Self, GenUiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            GenUiError::Configuration(format!("invalid todo API URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GenUiError::Configuration(format!(
                "todo API URL '{base_url}' cannot be a base URL"
            )));
        }
        Ok(Self { base_url })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GenUiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    async fn create_todo(&self, request: CreateTodo) -> Result<Todo, GenUiError> {
        debug!(title = %request.title, "createTodo");
        let resp = shared_client()
            .post(self.url(&["todos"]))
            .json(&request)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn list_todos(&self, filter: TodoFilter) -> Result<Vec<Todo>, GenUiError> {
        debug!(?filter, "listTodos");
        let resp = shared_client()
            .get(self.url(&["todos"]))
            .query(&filter)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn get_todo(&self, id: &str) -> Result<Todo, GenUiError> {
        let resp = shared_client().get(self.url(&["todos", id])).send().await?;
        Self::decode(resp).await
    }

    async fn update_todo(&self, id: &str, changes: UpdateTodo) -> Result<Todo, GenUiError> {
        let resp = shared_client()
            .patch(self.url(&["todos", id]))
            .json(&changes)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete_todo(&self, id: &str) -> Result<Todo, GenUiError> {
        let resp = shared_client()
            .delete(self.url(&["todos", id]))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn bulk_update_status(
        &self,
        ids: &[String],
        status: TodoStatus,
    ) -> Result<BulkOutcome, GenUiError> {
        let resp = shared_client()
            .post(self.url(&["todos", "bulk", "status"]))
            .json(&serde_json::json!({ "ids": ids, "status": status }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<BulkOutcome, GenUiError> {
        let resp = shared_client()
            .post(self.url(&["todos", "bulk", "delete"]))
            .json(&serde_json::json!({ "ids": ids }))
            .send()
            .await?;
        Self::decode(resp).await
    }
}
