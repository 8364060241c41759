//! Convenience re-exports for common use.

pub use crate::config::GenUiConfig;
pub use crate::error::{ErrorCategory, GenUiError, Result};
pub use crate::orchestration::{
    LoopState, Orchestrator, RenderRetryHandler, RenderRetryRequest, RetryDecision, RunHandle,
    RunResult, RunStatus, SubmitOutcome, UiEvent, UiEventSink,
};
pub use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
pub use crate::render::{RenderSandbox, TemplateSandbox};
pub use crate::tools::{HttpTodoApi, SiteToolExecutor, TodoApi, ToolExecutor};
pub use crate::types::{ConversationTurn, RenderArgs, Role, ToolCall, ToolResult, UserAction};
