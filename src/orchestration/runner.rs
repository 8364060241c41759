//! The conversation loop and the handle used to steer a running session.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::GenUiConfig;
use crate::error::GenUiError;
use crate::provider::{create_provider, ModelProvider, ProviderClient, ToolDeclaration};
use crate::render::{RenderPipeline, RenderSandbox, TemplateSandbox};
use crate::tools::{all_declarations, ToolExecutor};
use crate::types::{ConversationTurn, UserAction};

use super::dispatcher::CallDispatcher;
use super::events::{RenderRetryHandler, UiEmitter, UiEvent, UiEventSink};
use super::gate::SubmitOutcome;
use super::session::Session;
use super::types::{DispatchOutcome, LoopState, RunId, RunResult};

/// System instruction of the main conversation.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an assistant for a todo \
application. Fulfil the user's request by calling the todo tools.

Use the `render` tool to show the user what is happening:
- Before any destructive or bulk change, render a `confirm` step whose \
actions include one with `continues: true`, and wait for the decision that \
comes back as the tool result.
- Use `preview`, `progress` and `result` steps to show data and outcomes.
- Render the final outcome with `taskCompleted: true`; nothing runs after it.

If the user cancels, stop and say so. Answer in plain text when no UI is needed.";

/// Drives generative-UI sessions.
///
/// One `Orchestrator` can start many runs; each [`execute`](Self::execute)
/// call owns its own session, conversation and render client.
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    render_provider: Arc<dyn ModelProvider>,
    executor: Arc<dyn ToolExecutor>,
    sandbox: Arc<dyn RenderSandbox>,
    sink: Option<UiEventSink>,
    retry_handler: Option<RenderRetryHandler>,
    declarations: Vec<ToolDeclaration>,
    system_instruction: String,
    temperature: Option<f64>,
    render_temperature: Option<f64>,
    include_thoughts: bool,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        render_provider: Arc<dyn ModelProvider>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            provider,
            render_provider,
            executor,
            sandbox: Arc::new(TemplateSandbox::new()),
            sink: None,
            retry_handler: None,
            declarations: all_declarations(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            temperature: None,
            render_temperature: None,
            include_thoughts: false,
            max_iterations: crate::config::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Build providers and settings from configuration.
    pub fn from_config(
        config: &GenUiConfig,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<Self, GenUiError> {
        config.validate()?;
        let provider = create_provider(&config.model, config)?;
        let render_provider = create_provider(&config.render_model, config)?;
        let mut orchestrator = Self::new(provider, render_provider, executor)
            .with_temperature(config.temperature)
            .with_render_temperature(config.render_temperature)
            .with_thoughts(config.include_thoughts)
            .with_max_iterations(config.max_iterations);
        if let Some(instruction) = &config.system_instruction {
            orchestrator = orchestrator.with_system_instruction(instruction.clone());
        }
        Ok(orchestrator)
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn RenderSandbox>) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_event_sink(mut self, sink: UiEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_retry_handler(mut self, handler: RenderRetryHandler) -> Self {
        self.retry_handler = Some(handler);
        self
    }

    pub fn with_declarations(mut self, declarations: Vec<ToolDeclaration>) -> Self {
        self.declarations = declarations;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_render_temperature(mut self, temperature: f64) -> Self {
        self.render_temperature = Some(temperature);
        self
    }

    pub fn with_thoughts(mut self, include: bool) -> Self {
        self.include_thoughts = include;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Start a run for `input` on the current tokio runtime.
    pub fn execute(&self, input: impl Into<String>) -> RunHandle {
        let run_id = RunId::new_v4();
        let session = Arc::new(Session::new(run_id));
        let emitter = UiEmitter::new(run_id, self.sink.clone());

        let mut client = ProviderClient::new(self.provider.clone())
            .with_system_instruction(self.system_instruction.clone())
            .with_tool_declarations(self.declarations.clone())
            .with_thoughts(self.include_thoughts);
        if let Some(temperature) = self.temperature {
            client = client.with_temperature(temperature);
        }

        let mut pipeline = RenderPipeline::new(self.render_provider.clone(), self.sandbox.clone());
        if let Some(temperature) = self.render_temperature {
            pipeline = pipeline.with_temperature(temperature);
        }

        let dispatcher = CallDispatcher::new(
            session.clone(),
            self.executor.clone(),
            pipeline,
            emitter.clone(),
            self.retry_handler.clone(),
        );
        let run_loop = RunLoop {
            session: session.clone(),
            client,
            dispatcher,
            emitter,
            max_iterations: self.max_iterations,
        };

        let input = input.into();
        let join = tokio::spawn(run_loop.run(input));
        RunHandle {
            controller: RunController { session },
            join,
        }
    }
}

struct RunLoop {
    session: Arc<Session>,
    client: ProviderClient,
    dispatcher: CallDispatcher,
    emitter: UiEmitter,
    max_iterations: usize,
}

impl RunLoop {
    async fn run(self, input: String) -> RunResult {
        info!(run_id = %self.session.run_id(), "run started");
        let outcome = self.drive(input).await;
        self.finish(outcome)
    }

    async fn drive(&self, input: String) -> Result<(), GenUiError> {
        let mut tail = vec![ConversationTurn::user(input)];

        for iteration in 0..self.max_iterations {
            self.session.ensure_active()?;
            self.session.set_state(LoopState::AwaitingProvider);
            debug!(run_id = %self.session.run_id(), iteration, turns = tail.len(), "provider round trip");

            let response = tokio::select! {
                _ = self.session.cancel_token().cancelled() => {
                    return Err(self.cancelled());
                }
                response = self.client.send(&tail, true) => response?,
            };
            self.session.ensure_active()?;

            if let Some(thinking) = response.thinking.as_deref().filter(|t| !t.is_empty()) {
                self.emitter.thinking(thinking);
            }

            if response.tool_calls.is_empty() {
                self.emitter.emit(UiEvent::Response {
                    text: response.text.unwrap_or_default(),
                });
                return Ok(());
            }

            self.session.set_state(LoopState::Dispatching);
            match self.dispatcher.dispatch(&response.tool_calls).await? {
                DispatchOutcome::Completed => return Ok(()),
                DispatchOutcome::Results(results) => {
                    tail = response
                        .tool_calls
                        .into_iter()
                        .zip(results)
                        .flat_map(|(call, result)| {
                            [
                                ConversationTurn::tool_call(call),
                                ConversationTurn::tool_result(result),
                            ]
                        })
                        .collect();
                }
            }
        }

        Err(GenUiError::IterationLimit(self.max_iterations))
    }

    fn finish(&self, outcome: Result<(), GenUiError>) -> RunResult {
        let run_id = self.session.run_id();
        match outcome {
            Ok(()) => {
                self.emitter.emit(UiEvent::Complete);
                self.session.set_state(LoopState::Completed);
                info!(%run_id, "run completed");
                RunResult::completed()
            }
            Err(err) if !err.is_cancellation() && !self.session.is_aborted() => {
                error!(%run_id, error = %err, category = ?err.category(), "run failed");
                self.emitter.emit(UiEvent::Error {
                    message: err.to_string(),
                    category: err.category(),
                });
                self.emitter.emit(UiEvent::Complete);
                self.session.set_state(LoopState::Errored);
                RunResult::errored(err.to_string())
            }
            Err(_) => {
                self.emitter.ui("");
                self.emitter.thinking("");
                self.session.set_state(LoopState::Aborted);
                info!(%run_id, "run aborted");
                RunResult::aborted(self.session.abort_reason())
            }
        }
    }

    fn cancelled(&self) -> GenUiError {
        self.session
            .ensure_active()
            .err()
            .unwrap_or_else(|| GenUiError::Aborted("cancelled".into()))
    }
}

/// Clonable control surface of a running session.
#[derive(Clone)]
pub struct RunController {
    session: Arc<Session>,
}

impl RunController {
    pub fn run_id(&self) -> RunId {
        self.session.run_id()
    }

    /// Abort the run. Safe to call any number of times, at any point.
    pub fn abort(&self) -> bool {
        self.session.abort(None)
    }

    pub fn abort_with_reason(&self, reason: impl Into<String>) -> bool {
        self.session.abort(Some(reason.into()))
    }

    /// Deliver a user decision to the UI waiting for one.
    pub fn submit_user_action(&self, action: UserAction) -> SubmitOutcome {
        self.session.gate().submit(action)
    }

    pub fn state(&self) -> LoopState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.session.subscribe()
    }

    /// Wait until the loop reaches `target` or a terminal state, whichever
    /// comes first, and return the state observed.
    pub async fn wait_for_state(&self, target: LoopState) -> LoopState {
        let mut rx = self.session.subscribe();
        let observed = match rx.wait_for(|state| *state == target || state.is_terminal()).await {
            Ok(state) => *state,
            Err(_) => self.session.state(),
        };
        observed
    }
}

/// Handle to a spawned run.
pub struct RunHandle {
    controller: RunController,
    join: JoinHandle<RunResult>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.controller.run_id()
    }

    pub fn abort(&self) -> bool {
        self.controller.abort()
    }

    pub fn abort_with_reason(&self, reason: impl Into<String>) -> bool {
        self.controller.abort_with_reason(reason)
    }

    pub fn submit_user_action(&self, action: UserAction) -> SubmitOutcome {
        self.controller.submit_user_action(action)
    }

    pub fn state(&self) -> LoopState {
        self.controller.state()
    }

    pub async fn wait_for_state(&self, target: LoopState) -> LoopState {
        self.controller.wait_for_state(target).await
    }

    pub fn controller(&self) -> RunController {
        self.controller.clone()
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> RunResult {
        match self.join.await {
            Ok(result) => result,
            Err(err) => {
                error!(run_id = %self.controller.run_id(), error = %err, "run task failed");
                RunResult::errored(format!("run task failed: {err}"))
            }
        }
    }
}
