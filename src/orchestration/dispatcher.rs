//! Dispatch of one batch of model tool calls.
//!
//! Site calls fan out concurrently; render calls run one at a time, in
//! order, alongside them. Results are merged back by original index.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::error::GenUiError;
use crate::render::{RenderPipeline, RenderedUi};
use crate::tools::ToolExecutor;
use crate::types::{RenderArgs, ToolCall, ToolResult, UserAction, RENDER_TOOL_NAME};

use super::events::{RenderRetryHandler, RenderRetryRequest, RetryDecision, UiEmitter, UiEvent};
use super::gate::PendingDecision;
use super::session::Session;
use super::types::{DispatchOutcome, LoopState};

/// How a call is routed.
#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    Site,
    /// Named `render` but with arguments that do not validate.
    InvalidRender(String),
    Render(RenderArgs),
}

/// Route a call by name and, for renders, by argument shape.
pub fn classify(call: &ToolCall) -> CallKind {
    if !call.is_render() {
        return CallKind::Site;
    }
    match RenderArgs::from_arguments(&call.arguments) {
        Ok(args) => CallKind::Render(args),
        Err(reason) => CallKind::InvalidRender(reason),
    }
}

#[derive(Default)]
struct RenderPhase {
    results: Vec<(usize, ToolResult)>,
    completed: bool,
}

/// Executes tool-call batches for one session.
pub struct CallDispatcher {
    session: Arc<Session>,
    executor: Arc<dyn ToolExecutor>,
    pipeline: RenderPipeline,
    emitter: UiEmitter,
    retry_handler: Option<RenderRetryHandler>,
}

impl CallDispatcher {
    pub(crate) fn new(
        session: Arc<Session>,
        executor: Arc<dyn ToolExecutor>,
        pipeline: RenderPipeline,
        emitter: UiEmitter,
        retry_handler: Option<RenderRetryHandler>,
    ) -> Self {
        Self {
            session,
            executor,
            pipeline,
            emitter,
            retry_handler,
        }
    }

    /// Run every call of the batch and return results in call order, or
    /// `Completed` if a terminal UI was shown.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Result<DispatchOutcome, GenUiError> {
        self.session.ensure_active()?;

        let mut normal = Vec::new();
        let mut renders = Vec::new();
        for (index, call) in calls.iter().enumerate() {
            match classify(call) {
                CallKind::Render(args) => renders.push((index, args)),
                kind => normal.push((index, call, kind)),
            }
        }
        debug!(
            run_id = %self.session.run_id(),
            normal = normal.len(),
            renders = renders.len(),
            "dispatch partition"
        );

        let normal_calls = join_all(
            normal
                .into_iter()
                .map(|(index, call, kind)| async move { (index, self.run_normal(call, kind).await) }),
        );
        let (normal_results, render_phase) = tokio::join!(normal_calls, self.run_renders(&renders));

        let render_phase = render_phase?;
        let mut slots: Vec<Option<ToolResult>> = vec![None; calls.len()];
        for (index, result) in normal_results {
            slots[index] = Some(result?);
        }
        self.session.ensure_active()?;

        if render_phase.completed {
            debug!(run_id = %self.session.run_id(), "terminal UI shown, batch complete");
            return Ok(DispatchOutcome::Completed);
        }
        for (index, result) in render_phase.results {
            slots[index] = Some(result);
        }

        let mut results = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(result) => results.push(result),
                None => {
                    error!(index, "no result recorded for tool call");
                    return Err(GenUiError::InvalidState(format!(
                        "missing result for tool call at index {index}"
                    )));
                }
            }
        }
        Ok(DispatchOutcome::Results(results))
    }

    async fn run_normal(&self, call: &ToolCall, kind: CallKind) -> Result<ToolResult, GenUiError> {
        self.session.ensure_active()?;
        let result = match kind {
            CallKind::InvalidRender(reason) => {
                warn!(%reason, "render call with invalid arguments");
                ToolResult::error(&call.name, format!("Invalid render arguments: {reason}"))
            }
            _ => self.executor.execute(call).await,
        };
        self.session.ensure_active()?;
        Ok(result)
    }

    async fn run_renders(&self, renders: &[(usize, RenderArgs)]) -> Result<RenderPhase, GenUiError> {
        let mut phase = RenderPhase::default();
        for (index, args) in renders {
            self.session.ensure_active()?;
            let ui = self.render_with_retry(args).await?;
            self.session.ensure_active()?;

            if args.is_terminal() {
                self.emitter.ui(ui.html);
                phase.completed = true;
                break;
            }

            let value = if args.requires_confirmation() {
                // Register before the UI goes out: a host may answer from
                // inside its `Ui` handler.
                let pending = self.session.gate().await_decision()?;
                self.emitter.ui(ui.html);
                let action = self.await_user_action(args, pending).await?;
                self.emitter.emit(UiEvent::UserAction {
                    action: action.clone(),
                });
                action.to_result_value()
            } else {
                self.emitter.ui(ui.html);
                serde_json::json!({ "type": "uiDisplayed", "stepType": args.step_type })
            };
            phase
                .results
                .push((*index, ToolResult::success(RENDER_TOOL_NAME, value)));
        }
        Ok(phase)
    }

    async fn render_with_retry(&self, args: &RenderArgs) -> Result<RenderedUi, GenUiError> {
        let err = match self.attempt(args).await {
            Ok(ui) => return Ok(ui),
            Err(err) if !err.is_render_failure() => return Err(err),
            Err(err) => err,
        };
        warn!(error = %err, step = %args.step_type, "render attempt failed");

        match self.ask_retry(&err, args).await? {
            RetryDecision::Retry => {
                debug!("retrying render");
                self.attempt(args).await
            }
            RetryDecision::Decline => Err(GenUiError::RenderDeclined(err.to_string())),
        }
    }

    async fn attempt(&self, args: &RenderArgs) -> Result<RenderedUi, GenUiError> {
        self.session.ensure_active()?;
        let code = tokio::select! {
            _ = self.session.cancel_token().cancelled() => return Err(self.cancelled()),
            code = self.pipeline.generate(args) => code?,
        };
        self.session.ensure_active()?;
        self.pipeline.execute(&code, args)
    }

    async fn ask_retry(
        &self,
        err: &GenUiError,
        args: &RenderArgs,
    ) -> Result<RetryDecision, GenUiError> {
        let Some(handler) = &self.retry_handler else {
            return Ok(RetryDecision::Decline);
        };
        let request = RenderRetryRequest {
            error: err.to_string(),
            category: err.category(),
            main_goal: args.main_goal.clone(),
            step_type: args.step_type,
        };
        let decision = tokio::select! {
            _ = self.session.cancel_token().cancelled() => return Err(self.cancelled()),
            decision = handler(request) => decision,
        };
        self.session.ensure_active()?;
        Ok(decision)
    }

    async fn await_user_action(
        &self,
        args: &RenderArgs,
        pending: PendingDecision,
    ) -> Result<UserAction, GenUiError> {
        self.emitter.emit(UiEvent::ActionRequired {
            actions: args.actions.clone(),
        });
        self.session.set_state(LoopState::AwaitingUserAction);

        let decision = tokio::select! {
            _ = self.session.cancel_token().cancelled() => {
                self.session.gate().clear();
                Err(self.cancelled())
            }
            decision = pending.wait() => decision,
        };
        let action = decision?;
        self.session.ensure_active()?;
        self.session.set_state(LoopState::Dispatching);

        if !args.actions.iter().any(|a| a.id == action.action_id) {
            warn!(action_id = %action.action_id, "submitted action was not offered");
        }
        Ok(action)
    }

    fn cancelled(&self) -> GenUiError {
        self.session
            .ensure_active()
            .err()
            .unwrap_or_else(|| GenUiError::Aborted("cancelled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_by_name_and_shape() {
        assert_eq!(
            classify(&ToolCall::new("listTodos", json!({}))),
            CallKind::Site
        );
        assert!(matches!(
            classify(&ToolCall::new("render", json!({"mainGoal": "x"}))),
            CallKind::InvalidRender(_)
        ));
        let valid = json!({
            "dataStructureDescription": "d",
            "data": {},
            "mainGoal": "g",
            "subGoal": "s",
            "stepType": "result",
            "actions": []
        });
        assert!(matches!(
            classify(&ToolCall::new("render", valid)),
            CallKind::Render(_)
        ));
    }
}
