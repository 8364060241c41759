//! Translates generic tool calls into site API invocations.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::error::GenUiError;
use crate::types::{ToolCall, ToolResult};

use super::arguments::ToolArguments;
use super::site::{CreateTodo, TodoApi, TodoFilter, TodoStatus, UpdateTodo};

/// Executes one tool call. Never fails: errors come back as
/// `{"error": "..."}` results so the model can react to them.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ToolCall) -> ToolResult;
}

/// The fixed registry of site operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum SiteOperation {
    CreateTodo,
    ListTodos,
    GetTodoById,
    UpdateTodo,
    DeleteTodo,
    BulkUpdateStatus,
    BulkDelete,
}

impl SiteOperation {
    pub fn all() -> Vec<SiteOperation> {
        Self::iter().collect()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
struct UpdateArgs {
    id: String,
    #[serde(flatten)]
    changes: UpdateTodo,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BulkStatusArgs {
    ids: Vec<String>,
    status: TodoStatus,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BulkIdsArgs {
    ids: Vec<String>,
}

/// [`ToolExecutor`] backed by a [`TodoApi`].
pub struct SiteToolExecutor {
    api: Arc<dyn TodoApi>,
}

impl SiteToolExecutor {
    pub fn new(api: Arc<dyn TodoApi>) -> Self {
        Self { api }
    }

    async fn invoke(
        &self,
        operation: SiteOperation,
        args: &ToolArguments,
    ) -> Result<serde_json::Value, GenUiError> {
        match operation {
            SiteOperation::CreateTodo => {
                let request: CreateTodo = args.deserialize()?;
                to_value(self.api.create_todo(request).await?)
            }
            SiteOperation::ListTodos => {
                let filter: TodoFilter = args.deserialize()?;
                to_value(self.api.list_todos(filter).await?)
            }
            SiteOperation::GetTodoById => {
                let IdArgs { id } = args.deserialize()?;
                to_value(self.api.get_todo(&id).await?)
            }
            SiteOperation::UpdateTodo => {
                let UpdateArgs { id, changes } = args.deserialize()?;
                if changes.is_empty() {
                    return Err(GenUiError::InvalidArgument(
                        "updateTodo requires at least one field to change".into(),
                    ));
                }
                to_value(self.api.update_todo(&id, changes).await?)
            }
            SiteOperation::DeleteTodo => {
                let IdArgs { id } = args.deserialize()?;
                to_value(self.api.delete_todo(&id).await?)
            }
            SiteOperation::BulkUpdateStatus => {
                let BulkStatusArgs { ids, status } = args.deserialize()?;
                require_ids(&ids)?;
                to_value(self.api.bulk_update_status(&ids, status).await?)
            }
            SiteOperation::BulkDelete => {
                let BulkIdsArgs { ids } = args.deserialize()?;
                require_ids(&ids)?;
                to_value(self.api.bulk_delete(&ids).await?)
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for SiteToolExecutor {
    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Ok(operation) = SiteOperation::from_str(&call.name) else {
            return ToolResult::error(&call.name, format!("Unknown tool: {}", call.name));
        };
        let args = ToolArguments::new(call.arguments.clone());
        match self.invoke(operation, &args).await {
            Ok(value) => {
                debug!(tool = %call.name, "site call succeeded");
                ToolResult::success(&call.name, value)
            }
            Err(error) => {
                debug!(tool = %call.name, %error, "site call failed");
                ToolResult::error(&call.name, error.to_string())
            }
        }
    }
}

fn require_ids(ids: &[String]) -> Result<(), GenUiError> {
    if ids.is_empty() {
        return Err(GenUiError::InvalidArgument("ids must not be empty".into()));
    }
    Ok(())
}

fn to_value<T: Serialize>(value: T) -> Result<serde_json::Value, GenUiError> {
    Ok(serde_json::to_value(value)?)
}
